// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export module — CSV manifest persistence and label overlay previews.

pub mod csv;
pub mod overlay;

pub use csv::CsvExporter;
pub use overlay::{draw_labels, save_previews};
