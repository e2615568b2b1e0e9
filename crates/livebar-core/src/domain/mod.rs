//! Domain model (stream records, destination state, errors, ...).

pub mod destination;
pub mod errors;
pub mod game_index;
pub mod lease;
pub mod phase;
pub mod stream;

pub use self::destination::{DestinationState, WidgetConfig};
pub use self::errors::{ErrorKind, LivebarError, Result};
pub use self::game_index::GameIndex;
pub use self::lease::TokenLease;
pub use self::phase::TaskPhase;
pub use self::stream::{StreamRecord, rank_by_viewers, total_viewers};
