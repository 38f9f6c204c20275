use std::fmt::Debug;
use std::fmt::Error;
use std::fmt::Formatter;
use std::ops::{Add, AddAssign, Deref};
use std::time::Duration;
use std::time::Instant;

#[derive(Clone, Copy, Debug)]
pub struct MdxTimer {
    instant: Instant,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct MdxDuration {
    duration: Duration,
}

impl MdxTimer {
    pub fn now() -> Self {
        Self { instant: Instant::now() }
    }

    pub fn elapsed(&self) -> MdxDuration {
        MdxDuration { duration: self.instant.elapsed() }
    }
}

impl MdxDuration {
    pub fn to_millis_string(&self) -> String {
        const MICRO_PER_MILLI: u128 = 1_000;
        format!(
            "{}.{:03} ms",
            self.duration.as_micros() / MICRO_PER_MILLI,
            self.duration.as_micros() % MICRO_PER_MILLI
        )
    }

    pub fn to_seconds_string(&self) -> String {
        format!("{}.{:06} s", self.duration.as_secs(), self.duration.subsec_micros())
    }
}

impl Debug for MdxDuration {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{:?}", self.duration)
    }
}

impl Deref for MdxDuration {
    type Target = Duration;

    fn deref(&self) -> &Self::Target {
        &self.duration
    }
}

impl Add for MdxDuration {
    type Output = MdxDuration;

    fn add(mut self, rhs: Self) -> Self::Output {
        self.duration += rhs.duration;
        self
    }
}

impl AddAssign for MdxDuration {
    fn add_assign(&mut self, rhs: Self) {
        self.duration += rhs.duration;
    }
}
