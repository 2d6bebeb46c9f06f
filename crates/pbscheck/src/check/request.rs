use std::time::Duration;

use serde::Serialize;

use crate::common::error::PbsCheckError;
use crate::common::utils::time::format_hms_duration;
use crate::pbs::memory::MemorySize;
use crate::pbs::queue::QueueLimits;

/// Resources the user wants for the interactive job.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceRequest {
    pub cores: u32,
    pub memory: Option<MemorySize>,
    pub walltime: Option<Duration>,
}

impl ResourceRequest {
    /// Fails with the first queue limit the request exceeds.
    pub fn validate(&self, queue: &str, limits: &QueueLimits) -> crate::Result<()> {
        let exceeded = |resource, requested: String, limit: String| {
            Err(PbsCheckError::LimitExceeded {
                queue: queue.to_string(),
                resource,
                requested,
                limit,
            })
        };

        if self.cores > limits.max_cores {
            return exceeded(
                "cores",
                self.cores.to_string(),
                limits.max_cores.to_string(),
            );
        }
        if let Some(memory) = self.memory {
            if memory > limits.max_memory {
                return exceeded("memory", memory.to_string(), limits.max_memory.to_string());
            }
        }
        if let Some(walltime) = self.walltime {
            if walltime > limits.max_walltime {
                return exceeded(
                    "walltime",
                    format_hms_duration(&walltime),
                    format_hms_duration(&limits.max_walltime),
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::ResourceRequest;
    use crate::common::error::PbsCheckError;
    use crate::pbs::memory::MemorySize;
    use crate::pbs::queue::QueueLimits;

    fn limits() -> QueueLimits {
        QueueLimits {
            max_cores: 4,
            max_memory: MemorySize::from_gb(16),
            max_walltime: Duration::from_secs(12 * 3600),
            max_jobs_per_user: 1,
        }
    }

    #[test]
    fn request_within_limits() {
        let request = ResourceRequest {
            cores: 4,
            memory: Some(MemorySize::from_gb(16)),
            walltime: Some(Duration::from_secs(12 * 3600)),
        };
        assert!(request.validate("interactq", &limits()).is_ok());
        assert!(ResourceRequest::default().validate("interactq", &limits()).is_ok());
    }

    #[test]
    fn too_many_cores() {
        let request = ResourceRequest {
            cores: 8,
            ..Default::default()
        };
        let error = request.validate("interactq", &limits()).unwrap_err();
        assert!(matches!(
            error,
            PbsCheckError::LimitExceeded {
                resource: "cores",
                ..
            }
        ));
        assert_eq!(
            error.to_string(),
            "Requested cores (8) exceeds the interactq queue maximum of 4"
        );
    }

    #[test]
    fn too_much_memory() {
        let request = ResourceRequest {
            cores: 1,
            memory: Some(MemorySize::from_gb(17)),
            walltime: None,
        };
        let error = request.validate("interactq", &limits()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Requested memory (17gb) exceeds the interactq queue maximum of 16gb"
        );
    }

    #[test]
    fn too_long_walltime() {
        let request = ResourceRequest {
            cores: 1,
            memory: None,
            walltime: Some(Duration::from_secs(13 * 3600)),
        };
        let error = request.validate("interactq", &limits()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Requested walltime (13:00:00) exceeds the interactq queue maximum of 12:00:00"
        );
    }
}
