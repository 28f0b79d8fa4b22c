// Test module organization for the hashing containers.
// Compiled only under cfg(test) via the declaration in hashing/mod.rs.

use super::inline_set::InlineKeySet;
use super::probe_map::ProbeMap;
use super::probe_set::ProbeSet;
use super::robinhood::RobinHoodMap;

mod probe_map_tests;
mod robinhood_tests;
