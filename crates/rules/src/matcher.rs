use airgate_core::{Destination, Device, MatchRule};
use chrono::{DateTime, Local};

use crate::format::format_payload;

/// Wildcard keyword that selects every device.
pub const MATCH_ANY: &str = "*";

/// Whether a rule selects a device: the wildcard keyword, or a
/// case-sensitive substring of the device name or serial.
pub fn is_match(device: &Device, rule: &MatchRule) -> bool {
    rule.keyword == MATCH_ANY
        || device.name.contains(&rule.keyword)
        || device.serial.contains(&rule.keyword)
}

/// Outcome of routing one device through a job's rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome<'a> {
    /// No rule selected the device.
    NoMatch,
    /// Rules matched, but the device carried no recognized channel.
    NoData {
        /// How many rules had selected the device.
        matched: usize,
    },
    /// One payload, fanned out to every matching rule's destination.
    Dispatch {
        payload: String,
        /// Destinations in rule order. Duplicates are preserved: two rules
        /// pointing at the same endpoint publish twice, as configured.
        destinations: Vec<&'a Destination>,
    },
}

/// Route one device through the job's ordered rule set.
///
/// Every matching rule fires independently (fan-out, not first-match-wins).
/// The payload is computed once per device so all destinations in a cycle
/// receive identical bytes.
pub fn match_and_format<'a>(
    device: &Device,
    rules: &'a [MatchRule],
    now: DateTime<Local>,
) -> MatchOutcome<'a> {
    let destinations: Vec<&Destination> = rules
        .iter()
        .filter(|rule| is_match(device, rule))
        .map(|rule| &rule.destination)
        .collect();
    if destinations.is_empty() {
        return MatchOutcome::NoMatch;
    }

    match format_payload(device, now) {
        Some(payload) => MatchOutcome::Dispatch {
            payload,
            destinations,
        },
        None => MatchOutcome::NoData {
            matched: destinations.len(),
        },
    }
}
