// ASTRA - GPL-3.0-or-later
// This file is part of ASTRA.
//
// Copyright (C) 2025 ASTRA Collaboration
//
// ASTRA is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// ASTRA is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with ASTRA.  If not, see <https://www.gnu.org/licenses/>.

//! ASTRA: Autonomous System for Transient Research & Analysis.
//!
//! Scores newly reported astronomical transients against a fixed rubric,
//! ranks the interesting ones and renders a follow-up report.

pub mod anomaly;
pub mod candidate;
pub mod config;
pub mod crossmatch;
pub mod package;
pub mod pipeline;
pub mod report;
pub mod source;
