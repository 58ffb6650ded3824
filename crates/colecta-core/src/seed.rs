//! The master seed set and the synthetic-capture generator.
//!
//! Master records carry fixed, pre-assigned ids so re-seeding via upsert
//! is idempotent. Synthetic captures exist only to give a fresh store a
//! non-empty demo state; they are random by design, but their invariants
//! (indicator/axis agreement, the sync-status policy) are a contract.

use chrono::{DateTime, Duration, Utc};
use rand_core::RngCore;

use crate::axis::Axis;
use crate::record::{
  Capture, CapturePayload, CaptureStatus, GeoPoint, Indicator, Project, Role,
  SyncStatus, User,
};

/// Default password for master users on a freshly seeded store. Operators
/// are expected to rotate it.
pub const SEED_PASSWORD: &str = "changeme";

/// How many demo captures a fresh store receives.
pub const SYNTHETIC_CAPTURE_COUNT: usize = 15;

/// Synthetic capture locations are jittered around this point (Cali,
/// Colombia — the programme's home city).
pub const REFERENCE_POINT: GeoPoint = GeoPoint { lat: 3.4516, lng: -76.5320 };

/// Captures are dated within this window before "now".
const CAPTURE_WINDOW_DAYS: i64 = 30;

// ─── Master catalog ──────────────────────────────────────────────────────────

/// The two canonical users, ids 1–2. All share `password_hash` — the
/// caller hashes [`SEED_PASSWORD`] once and passes the PHC string in.
pub fn master_users(password_hash: &str) -> Vec<User> {
  vec![
    User {
      id:            Some(1),
      email:         "admin@colecta.org".into(),
      name:          "Programme Administrator".into(),
      password_hash: password_hash.to_owned(),
      role:          Role::Administrator,
    },
    User {
      id:            Some(2),
      email:         "tech@colecta.org".into(),
      name:          "Field Technician".into(),
      password_hash: password_hash.to_owned(),
      role:          Role::FieldTechnician,
    },
  ]
}

/// The one canonical project, id 1.
pub fn master_project() -> Project {
  Project {
    id:            Some(1),
    name:          "Goals for Life".into(),
    axis:          "Integral".into(),
    global_target: 100,
    active:        true,
    description:   "Flagship leadership-through-sport programme.".into(),
  }
}

/// The nine canonical indicators, ids 1–9, three per axis.
pub fn master_indicators() -> Vec<Indicator> {
  let project_id = 1;
  let rows: [(Axis, &str, &str); 9] = [
    (Axis::FemaleLeadership, "Self-Confidence Index", "80% with a gain above 3 points"),
    (Axis::FemaleLeadership, "Decision-Making Agency", "100% of participants"),
    (Axis::FemaleLeadership, "Rights Awareness", "90% of participants"),
    (Axis::PeaceTerritory, "Safe Space Perception", "95% positive perception"),
    (Axis::PeaceTerritory, "Conflict Resolution", "50% reduction in incidents"),
    (Axis::PeaceTerritory, "Intercultural Bonds", "one gathering every two months"),
    (Axis::SportsExcellence, "Retention Rate", "85% annual retention"),
    (Axis::SportsExcellence, "Competitive Performance", "at least 2 tournaments per year"),
    (Axis::SportsExcellence, "Athletic Progression", "2-3 players per cycle"),
  ];

  rows
    .into_iter()
    .enumerate()
    .map(|(i, (axis, name, target))| Indicator {
      id: Some(i as i64 + 1),
      project_id,
      axis,
      name: name.into(),
      target: target.into(),
    })
    .collect()
}

// ─── Synthetic captures ──────────────────────────────────────────────────────

/// Generate [`SYNTHETIC_CAPTURE_COUNT`] demo captures against the given
/// indicator set.
///
/// Invariants, regardless of the random source:
/// - the chosen indicator's axis equals the capture's own axis;
/// - `sync_status` is `Synced` only when `status` is `Approved`.
///
/// Production callers pass `OsRng`; tests pass a seeded generator.
pub fn synthetic_captures(
  rng: &mut dyn RngCore,
  indicators: &[Indicator],
  now: DateTime<Utc>,
) -> Vec<Capture> {
  // Only axes that actually have an indicator are eligible.
  let axes: Vec<Axis> = Axis::ALL
    .into_iter()
    .filter(|a| indicators.iter().any(|i| i.axis == *a))
    .collect();
  if axes.is_empty() {
    return Vec::new();
  }

  // 3 of 5 draws favour Approved.
  const STATUS_WEIGHTS: [CaptureStatus; 5] = [
    CaptureStatus::Approved,
    CaptureStatus::Approved,
    CaptureStatus::Approved,
    CaptureStatus::Draft,
    CaptureStatus::Rejected,
  ];

  let mut captures = Vec::with_capacity(SYNTHETIC_CAPTURE_COUNT);
  for _ in 0..SYNTHETIC_CAPTURE_COUNT {
    let axis = axes[pick(rng, axes.len() as u32) as usize];
    let Some(indicator) = indicators.iter().find(|i| i.axis == axis) else {
      continue; // unreachable: axes was filtered above
    };

    let age = Duration::seconds(
      pick(rng, (CAPTURE_WINDOW_DAYS * 24 * 3600) as u32) as i64,
    );

    let status = STATUS_WEIGHTS[pick(rng, 5) as usize];
    // Only approved records may already be synced, and ~70% of those.
    let sync_status = if status == CaptureStatus::Approved && pick(rng, 10) < 7
    {
      SyncStatus::Synced
    } else {
      SyncStatus::Pending
    };

    let payload = if pick(rng, 2) == 0 {
      CapturePayload::Count { total: 5 + pick(rng, 76) }
    } else {
      let n = 5 + pick(rng, 16);
      CapturePayload::Participants {
        scores: (0..n).map(|_| 1 + pick(rng, 5) as u8).collect(),
      }
    };

    captures.push(Capture {
      id: None,
      indicator_id: indicator.id.unwrap_or_default(),
      indicator_name: indicator.name.clone(),
      axis,
      captured_at: now - age,
      status,
      sync_status,
      payload,
      location: Some(GeoPoint {
        lat: REFERENCE_POINT.lat + jitter(rng),
        lng: REFERENCE_POINT.lng + jitter(rng),
      }),
    });
  }

  captures
}

/// Uniform draw in `0..bound`. The modulo bias is irrelevant for demo
/// data.
fn pick(rng: &mut dyn RngCore, bound: u32) -> u32 {
  rng.next_u32() % bound
}

/// Location jitter in degrees, within ±0.01.
fn jitter(rng: &mut dyn RngCore) -> f64 {
  (pick(rng, 2001) as f64 - 1000.0) / 100_000.0
}

#[cfg(test)]
mod tests {
  use super::*;

  /// SplitMix64 — small deterministic generator for reproducible
  /// fixtures.
  struct TestRng(u64);

  impl RngCore for TestRng {
    fn next_u32(&mut self) -> u32 {
      (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
      self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
      let mut z = self.0;
      z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
      z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
      z ^ (z >> 31)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
      for chunk in dest.chunks_mut(8) {
        let bytes = self.next_u64().to_le_bytes();
        chunk.copy_from_slice(&bytes[..chunk.len()]);
      }
    }

    fn try_fill_bytes(
      &mut self,
      dest: &mut [u8],
    ) -> Result<(), rand_core::Error> {
      self.fill_bytes(dest);
      Ok(())
    }
  }

  fn generate(seed: u64) -> Vec<Capture> {
    let mut rng = TestRng(seed);
    synthetic_captures(&mut rng, &master_indicators(), Utc::now())
  }

  #[test]
  fn master_catalog_cardinality() {
    assert_eq!(master_users("x").len(), 2);
    assert_eq!(master_indicators().len(), 9);
    // Three indicators per axis, ids pre-assigned and distinct.
    for axis in Axis::ALL {
      assert_eq!(
        master_indicators().iter().filter(|i| i.axis == axis).count(),
        3
      );
    }
    let ids: Vec<_> =
      master_indicators().iter().filter_map(|i| i.id).collect();
    assert_eq!(ids, (1..=9).collect::<Vec<i64>>());
  }

  #[test]
  fn generates_exactly_fifteen() {
    for seed in 0..8 {
      assert_eq!(generate(seed).len(), SYNTHETIC_CAPTURE_COUNT);
    }
  }

  #[test]
  fn capture_axis_matches_indicator_axis() {
    let indicators = master_indicators();
    for seed in 0..8 {
      for c in generate(seed) {
        let indicator = indicators
          .iter()
          .find(|i| i.id == Some(c.indicator_id))
          .expect("capture references a master indicator");
        assert_eq!(indicator.axis, c.axis);
        assert_eq!(indicator.name, c.indicator_name);
      }
    }
  }

  #[test]
  fn synced_implies_approved() {
    for seed in 0..32 {
      for c in generate(seed) {
        if c.sync_status == SyncStatus::Synced {
          assert_eq!(c.status, CaptureStatus::Approved);
        }
      }
    }
  }

  #[test]
  fn captured_within_window() {
    let now = Utc::now();
    for c in generate(7) {
      assert!(c.captured_at <= now);
      assert!(now - c.captured_at <= Duration::days(CAPTURE_WINDOW_DAYS));
    }
  }

  #[test]
  fn locations_jittered_near_reference() {
    for c in generate(3) {
      let loc = c.location.expect("synthetic captures carry a location");
      assert!((loc.lat - REFERENCE_POINT.lat).abs() <= 0.01 + f64::EPSILON);
      assert!((loc.lng - REFERENCE_POINT.lng).abs() <= 0.01 + f64::EPSILON);
    }
  }

  #[test]
  fn no_indicators_yields_no_captures() {
    let mut rng = TestRng(1);
    assert!(synthetic_captures(&mut rng, &[], Utc::now()).is_empty());
  }
}
