// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Scoring and ranking: how search results get their numbers.
//!
//! Two kinds of numbers feed a score. BM25 weighs prose matches by how rare
//! the term is and how long the field is. Static boosts say what kind of
//! match it was: a name beats a tag, a summary beats a body, a top-level
//! node beats something buried three levels deep.

mod core;
pub mod ranking;

pub use self::core::*;
