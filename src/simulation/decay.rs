//! Fill level decay.
//!
//! Each tick takes the whole station collection, lowers every non-empty
//! station by an amount drawn from a [`DecaySource`], and returns a *new*
//! collection together with the notifications triggered during that tick.
//! The input slice is never touched, so callers can swap the result in as a
//! single snapshot.
//!
//! # Randomness injection
//! The decrement comes from a `DecaySource` rather than an ambient RNG.
//! Production uses [`RandomDecay`] (seedable PCG); tests use [`FixedDecay`]
//! or a scripted source to assert exact before/after levels.

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

use crate::alert::crossings::detect_crossings;
use crate::alert::notifications::emit_for;
use crate::model::{Notification, Station};

// ---------------------------------------------------------------------------
// Decay sources
// ---------------------------------------------------------------------------

/// Supplies the amount a station's fill level drops on one tick.
pub trait DecaySource: Send {
    fn next_decrement(&mut self) -> u8;
}

/// Inclusive bounds of a random decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecayRange {
    min: u8,
    max: u8,
}

impl DecayRange {
    /// Returns `None` if `min > max`.
    pub fn new(min: u8, max: u8) -> Option<Self> {
        (min <= max).then_some(Self { min, max })
    }

    pub fn min(&self) -> u8 {
        self.min
    }

    pub fn max(&self) -> u8 {
        self.max
    }
}

impl Default for DecayRange {
    fn default() -> Self {
        Self { min: 2, max: 9 }
    }
}

/// Uniform random decrement within a [`DecayRange`].
pub struct RandomDecay {
    rng: Pcg64Mcg,
    range: DecayRange,
}

impl RandomDecay {
    /// Reproducible source for a given seed.
    pub fn seeded(range: DecayRange, seed: u64) -> Self {
        Self {
            rng: Pcg64Mcg::seed_from_u64(seed),
            range,
        }
    }

    /// Source seeded from OS entropy.
    pub fn from_entropy(range: DecayRange) -> Self {
        Self {
            rng: Pcg64Mcg::from_entropy(),
            range,
        }
    }
}

impl DecaySource for RandomDecay {
    fn next_decrement(&mut self) -> u8 {
        self.rng.gen_range(self.range.min..=self.range.max)
    }
}

/// Always drops by the same amount.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecay(pub u8);

impl DecaySource for FixedDecay {
    fn next_decrement(&mut self) -> u8 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// Result of one decay tick.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub tick_seq: u64,
    pub stations: Vec<Station>,
    /// Notifications in station iteration order, ready for
    /// `NotificationFeed::prepend_batch`.
    pub notifications: Vec<Notification>,
    /// Number of stations whose level changed.
    pub decayed: usize,
}

/// Runs one decay tick over the whole collection.
///
/// - Stations at 0 are carried over unchanged and never go negative.
/// - Every other station drops by `source.next_decrement()`, floored at 0,
///   with its status re-derived.
/// - Crossings are detected against the level at the start of this tick.
///
/// The decay source is consulted once per non-empty station, in order.
pub fn tick(
    stations: &[Station],
    source: &mut dyn DecaySource,
    tick_seq: u64,
    now: DateTime<Utc>,
) -> TickOutcome {
    let mut next = Vec::with_capacity(stations.len());
    let mut notifications = Vec::new();
    let mut decayed = 0;

    for station in stations {
        if station.is_empty() {
            next.push(station.clone());
            continue;
        }

        let drop = source.next_decrement();
        let level = i32::from(station.fill_level()) - i32::from(drop);
        let updated = station.with_fill_level(level.max(0), now);

        if updated.fill_level() != station.fill_level() {
            decayed += 1;
        }

        notifications.extend(
            detect_crossings(station, &updated)
                .iter()
                .map(|event| emit_for(event, tick_seq, now)),
        );
        next.push(updated);
    }

    TickOutcome {
        tick_seq,
        stations: next,
        notifications,
        decayed,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::thresholds::classify;
    use crate::model::{AnimalType, GeoPoint, NotificationKind, StationSeed, StationStatus};
    use chrono::TimeZone;
    use std::collections::VecDeque;

    /// Replays a fixed list of decrements, then repeats the last one.
    struct ScriptedDecay(VecDeque<u8>);

    impl DecaySource for ScriptedDecay {
        fn next_decrement(&mut self) -> u8 {
            if self.0.len() > 1 {
                self.0.pop_front().unwrap()
            } else {
                *self.0.front().unwrap()
            }
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    fn station(id: &str, fill_level: i32) -> Station {
        Station::from_seed(
            StationSeed {
                id: id.to_string(),
                name: format!("Station {}", id),
                city: "İzmir".to_string(),
                location: GeoPoint { latitude: 38.41, longitude: 27.13 },
                address: String::new(),
                fill_level,
                animal: AnimalType::Cat,
            },
            fixed_now(),
        )
    }

    // --- Decay sources ------------------------------------------------------

    #[test]
    fn test_decay_range_rejects_inverted_bounds() {
        assert!(DecayRange::new(9, 2).is_none());
        assert_eq!(DecayRange::new(3, 3).map(|r| (r.min(), r.max())), Some((3, 3)));
    }

    #[test]
    fn test_random_decay_stays_within_default_range() {
        let mut source = RandomDecay::seeded(DecayRange::default(), 7);
        for _ in 0..1_000 {
            let d = source.next_decrement();
            assert!((2..=9).contains(&d), "decrement {} outside [2, 9]", d);
        }
    }

    #[test]
    fn test_same_seed_gives_same_sequence() {
        let mut a = RandomDecay::seeded(DecayRange::default(), 42);
        let mut b = RandomDecay::seeded(DecayRange::default(), 42);
        let seq_a: Vec<u8> = (0..20).map(|_| a.next_decrement()).collect();
        let seq_b: Vec<u8> = (0..20).map(|_| b.next_decrement()).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn test_random_decay_covers_both_bounds() {
        let mut source = RandomDecay::seeded(DecayRange::default(), 1);
        let seen: std::collections::HashSet<u8> =
            (0..2_000).map(|_| source.next_decrement()).collect();
        assert!(seen.contains(&2) && seen.contains(&9));
    }

    // --- Tick ---------------------------------------------------------------

    #[test]
    fn test_tick_lowers_levels_and_rederives_status() {
        let stations = vec![station("a", 72), station("b", 50)];
        let outcome = tick(&stations, &mut FixedDecay(5), 1, fixed_now());

        assert_eq!(outcome.stations[0].fill_level(), 67);
        assert_eq!(outcome.stations[0].status(), StationStatus::Yellow);
        assert_eq!(outcome.stations[1].fill_level(), 45);
        assert_eq!(outcome.decayed, 2);
    }

    #[test]
    fn test_tick_does_not_mutate_input() {
        let stations = vec![station("a", 72)];
        let _ = tick(&stations, &mut FixedDecay(5), 1, fixed_now());
        assert_eq!(stations[0].fill_level(), 72);
    }

    #[test]
    fn test_tick_floors_at_zero() {
        let stations = vec![station("a", 4)];
        let outcome = tick(&stations, &mut FixedDecay(9), 1, fixed_now());
        assert_eq!(outcome.stations[0].fill_level(), 0);
        assert_eq!(outcome.stations[0].status(), StationStatus::Red);
    }

    #[test]
    fn test_empty_station_stays_empty_and_consumes_no_decrement() {
        let stations = vec![station("empty", 0), station("full", 100)];
        let mut source = ScriptedDecay(VecDeque::from(vec![3, 8]));
        let outcome = tick(&stations, &mut source, 1, fixed_now());

        assert_eq!(outcome.stations[0], stations[0]);
        assert_eq!(outcome.stations[1].fill_level(), 97, "first decrement goes to the non-empty station");
        assert_eq!(outcome.decayed, 1);
        assert!(outcome.notifications.is_empty());
    }

    #[test]
    fn test_floor_is_idempotent_across_many_ticks() {
        let mut stations = vec![station("a", 3)];
        let mut source = RandomDecay::seeded(DecayRange::default(), 99);
        for seq in 1..=50 {
            stations = tick(&stations, &mut source, seq, fixed_now()).stations;
            assert_eq!(stations[0].fill_level(), 0);
        }
    }

    #[test]
    fn test_monotonic_and_status_consistent_under_random_decay() {
        let mut stations: Vec<Station> =
            (0..=100).map(|lvl| station(&format!("s{}", lvl), lvl)).collect();
        let mut source = RandomDecay::seeded(DecayRange::default(), 2024);

        for seq in 1..=30 {
            let outcome = tick(&stations, &mut source, seq, fixed_now());
            for (before, after) in stations.iter().zip(&outcome.stations) {
                assert!(after.fill_level() <= before.fill_level());
                assert_eq!(after.status(), classify(i32::from(after.fill_level())));
                assert_eq!(after.id, before.id);
            }
            stations = outcome.stations;
        }
    }

    #[test]
    fn test_warning_fires_once_then_not_again_inside_band() {
        let stations = vec![station("a", 75)];
        let first = tick(&stations, &mut FixedDecay(10), 1, fixed_now());
        assert_eq!(first.stations[0].fill_level(), 65);
        assert_eq!(first.notifications.len(), 1);
        assert_eq!(first.notifications[0].kind, NotificationKind::Warning);

        let second = tick(&first.stations, &mut FixedDecay(5), 2, fixed_now());
        assert_eq!(second.stations[0].fill_level(), 60);
        assert!(second.notifications.is_empty());
    }

    #[test]
    fn test_single_tick_to_zero_fires_all_three() {
        let stations = vec![station("a", 75)];
        let outcome = tick(&stations, &mut FixedDecay(75), 3, fixed_now());
        let kinds: Vec<_> = outcome.notifications.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![NotificationKind::Warning, NotificationKind::Critical, NotificationKind::Emergency]
        );
        assert!(outcome.notifications.iter().all(|n| n.id.ends_with("_t3")));
    }

    #[test]
    fn test_notifications_follow_station_order() {
        let stations = vec![station("first", 71), station("second", 21)];
        let outcome = tick(&stations, &mut FixedDecay(2), 1, fixed_now());
        let ids: Vec<_> = outcome.notifications.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["warn_first_t1", "crit_second_t1"]);
    }
}
