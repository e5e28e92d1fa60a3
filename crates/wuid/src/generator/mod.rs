mod mutex;
mod wuid;

pub use self::wuid::*;
