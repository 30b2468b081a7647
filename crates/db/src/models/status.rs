//! Status enums backed by constrained `TEXT` columns.
//!
//! Each variant's string value matches the `CHECK (status IN (...))` list in
//! the corresponding migration.

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Return the database column value.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $val ),+
                }
            }

            /// Parse a database column value.
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

define_status_enum! {
    /// Training job lifecycle status.
    TrainingStatus {
        Pending = "pending",
        Training = "training",
        Completed = "completed",
        Failed = "failed",
    }
}

define_status_enum! {
    /// Generation job lifecycle status.
    GenerationStatus {
        Processing = "processing",
        Completed = "completed",
        Failed = "failed",
        ContentRejected = "content_rejected",
    }
}

define_status_enum! {
    /// Push platform of a registered device.
    DevicePlatform {
        Ios = "ios",
        Android = "android",
    }
}

impl TrainingStatus {
    /// Whether `self -> next` is a permitted transition.
    ///
    /// Forward moves follow `pending -> training -> completed`. A job may
    /// also complete straight from `pending` when the `training` write was
    /// lost. `failed` can be entered from any other state, including
    /// `completed`, so a model whose remote character disappears can be
    /// retired.
    pub fn can_transition_to(self, next: TrainingStatus) -> bool {
        use TrainingStatus::*;
        matches!(
            (self, next),
            (Pending, Training)
                | (Pending | Training, Completed)
                | (Pending | Training | Completed, Failed)
        )
    }

    /// Statuses from which `next` may be entered.
    pub fn predecessors_of(next: TrainingStatus) -> Vec<TrainingStatus> {
        Self::ALL
            .iter()
            .copied()
            .filter(|s| s.can_transition_to(next))
            .collect()
    }

    /// Statuses whose poll loop may still be running.
    pub fn is_in_flight(self) -> bool {
        matches!(self, TrainingStatus::Pending | TrainingStatus::Training)
    }
}

impl GenerationStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GenerationStatus::Processing)
    }

    /// Only `processing` moves, and only into a terminal status.
    pub fn can_transition_to(self, next: GenerationStatus) -> bool {
        self == GenerationStatus::Processing && next.is_terminal()
    }
}

/// Convert a slice of statuses into the `TEXT[]` bind value for `= ANY($n)`.
pub(crate) fn status_strings<T: Copy>(statuses: &[T], as_str: fn(T) -> &'static str) -> Vec<String> {
    statuses.iter().map(|s| as_str(*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn training_forward_path() {
        assert!(TrainingStatus::Pending.can_transition_to(TrainingStatus::Training));
        assert!(TrainingStatus::Training.can_transition_to(TrainingStatus::Completed));
        assert!(TrainingStatus::Pending.can_transition_to(TrainingStatus::Completed));
        assert!(!TrainingStatus::Failed.can_transition_to(TrainingStatus::Completed));
        assert!(!TrainingStatus::Completed.can_transition_to(TrainingStatus::Training));
    }

    #[test]
    fn training_failed_reachable_from_all_but_itself() {
        assert_eq!(
            TrainingStatus::predecessors_of(TrainingStatus::Failed),
            vec![
                TrainingStatus::Pending,
                TrainingStatus::Training,
                TrainingStatus::Completed
            ]
        );
    }

    #[test]
    fn generation_terminal_states_are_final() {
        for from in GenerationStatus::ALL {
            for to in GenerationStatus::ALL {
                let allowed = from.can_transition_to(*to);
                assert_eq!(
                    allowed,
                    *from == GenerationStatus::Processing && *to != GenerationStatus::Processing,
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn parse_round_trips_column_values() {
        for status in GenerationStatus::ALL {
            assert_eq!(GenerationStatus::parse(status.as_str()), Some(*status));
        }
        assert_eq!(TrainingStatus::parse("queued"), None);
        assert_eq!(DevicePlatform::parse("android"), Some(DevicePlatform::Android));
    }

    #[test]
    fn serializes_as_column_value() {
        let json = serde_json::to_string(&GenerationStatus::ContentRejected).unwrap();
        assert_eq!(json, "\"content_rejected\"");
    }
}
