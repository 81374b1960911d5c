//! Status helper enums mapping to SMALLSERIAL lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table.

use reelsmith_core::task_state::TaskStatus;

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Look up a variant by database status ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Row status in `pipeline_tasks`, seeded in `task_statuses`.
    TaskStatusId {
        Queued = 1,
        Running = 2,
        Completed = 3,
        Failed = 4,
    }
}

impl From<TaskStatus> for TaskStatusId {
    fn from(value: TaskStatus) -> Self {
        match value {
            TaskStatus::Queued => Self::Queued,
            TaskStatus::Running => Self::Running,
            TaskStatus::Completed => Self::Completed,
            TaskStatus::Failed => Self::Failed,
        }
    }
}

impl From<TaskStatusId> for TaskStatus {
    fn from(value: TaskStatusId) -> Self {
        match value {
            TaskStatusId::Queued => Self::Queued,
            TaskStatusId::Running => Self::Running,
            TaskStatusId::Completed => Self::Completed,
            TaskStatusId::Failed => Self::Failed,
        }
    }
}
