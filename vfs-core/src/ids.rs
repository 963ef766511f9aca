//! Arena index newtypes, per the design note in spec §9: "represent the
//! graph with arena indices ... `ent` becomes an optional index."

use std::fmt;

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

arena_id!(InodeId);
arena_id!(EntryId);
arena_id!(SuperId);
arena_id!(HandleId);
arena_id!(DirId);
