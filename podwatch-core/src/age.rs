//! Resource ages, rendered the way `kubectl` plugins written in Go print them.
use jiff::Timestamp;
use serde::{Serialize, Serializer};
use std::fmt;

/// The age of a resource, in whole seconds.
///
/// [`Display`](fmt::Display) follows the Go standard library's [`time.Duration.String()`] for a
/// duration rounded to the second: `0s`, `45s`, `2m5s`, `1h0m0s`, `49h3m7s`.
///
/// # On Signedness
///
/// A creation timestamp ahead of the local clock (clock skew between the client and the API
/// server) produces a negative age. This is kept rather than clamped, and is rendered with a
/// leading `-` just like Go does.
///
/// [`time.Duration.String()`]: https://pkg.go.dev/time#Duration.String
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Age {
    secs: i64,
}

impl Age {
    /// An age of exactly `secs` seconds
    pub const fn from_secs(secs: i64) -> Self {
        Self { secs }
    }

    /// Elapsed time from `created` until `now`, rounded half away from zero to whole seconds
    pub fn between(created: Timestamp, now: Timestamp) -> Self {
        let elapsed = now.duration_since(created);
        let mut secs = elapsed.as_secs();
        let nanos = elapsed.subsec_nanos();
        if nanos >= 500_000_000 {
            secs += 1;
        } else if nanos <= -500_000_000 {
            secs -= 1;
        }
        Self { secs }
    }

    /// Whole seconds
    pub fn as_secs(&self) -> i64 {
        self.secs
    }

    /// Whether the resource claims to have been created in the future
    pub fn is_negative(&self) -> bool {
        self.secs < 0
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            f.write_str("-")?;
        }
        let total = self.secs.unsigned_abs();
        let (hours, mins, secs) = (total / 3600, total / 60 % 60, total % 60);
        if hours > 0 {
            write!(f, "{hours}h{mins}m{secs}s")
        } else if mins > 0 {
            write!(f, "{mins}m{secs}s")
        } else {
            write!(f, "{secs}s")
        }
    }
}

impl Serialize for Age {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}
