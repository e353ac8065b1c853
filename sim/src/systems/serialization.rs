//! Serialization utilities for snapshots and inbound particle batches.

use crate::world::{ExternalParticle, Snapshot};

/// Serialize a snapshot to a JSON string.
pub fn snapshot_to_json_string(snapshot: &Snapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(snapshot)
}

/// Deserialize a snapshot from a JSON string.
pub fn snapshot_from_json_string(data: &str) -> Result<Snapshot, serde_json::Error> {
    serde_json::from_str(data)
}

/// Decode a batch of externally owned particles (a JSON array).
pub fn external_particles_from_json(data: &[u8]) -> Result<Vec<ExternalParticle>, serde_json::Error> {
    serde_json::from_slice(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::ParticleSnapshot;

    #[test]
    fn test_snapshot_roundtrip() {
        let snapshot = Snapshot {
            tick: 42,
            particles: vec![ParticleSnapshot {
                id: 1,
                x: 10.0,
                y: 20.0,
                vx: 1.0,
                vy: 0.0,
                left: 2,
                right: 5,
                close: 1,
            }],
        };

        let json = snapshot_to_json_string(&snapshot).unwrap();
        let restored = snapshot_from_json_string(&json).unwrap();

        assert_eq!(restored.tick, 42);
        assert_eq!(restored.particles.len(), 1);
        assert_eq!(restored.particles[0], snapshot.particles[0]);
    }

    #[test]
    fn test_external_batch_decodes() {
        let data = br#"[{"id":7,"x":1.0,"y":2.0,"vx":0.0,"vy":1.0},{"id":8,"x":-1.0,"y":0.5,"vx":1.0,"vy":0.0}]"#;
        let batch = external_particles_from_json(data).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].id, 7);
        assert_eq!(batch[1].x, -1.0);
    }

    #[test]
    fn test_external_batch_rejects_missing_fields() {
        let data = br#"[{"id":7,"x":1.0}]"#;
        assert!(external_particles_from_json(data).is_err());
    }
}
