//! Command parameter sets and the per-field validated builders.
//!
//! Each builder checks its value against the field's legal range and bundles
//! the auxiliary fields the firmware treats as one mutually exclusive group.

/// Ordered field → value pairs; insertion order is wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandParams {
    entries: Vec<(&'static str, i32)>,
}

impl CommandParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field`, keeping its original position if already present.
    pub fn with(mut self, field: &'static str, value: i32) -> Self {
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<i32> {
        self.entries.iter().find(|(f, _)| *f == field).map(|(_, v)| *v)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(f, _)| *f)
    }

    pub fn values(&self) -> impl Iterator<Item = i32> + '_ {
        self.entries.iter().map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Why a setter returned without sending anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Unbound,
    OutOfRange { field: &'static str, value: i32 },
}

/// Result of a command or status call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Sent,
    Skipped(SkipReason),
}

impl Outcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Outcome::Sent)
    }
}

type Built = std::result::Result<CommandParams, SkipReason>;

fn checked(field: &'static str, value: i32, ok: bool) -> Built {
    if ok {
        Ok(CommandParams::new().with(field, value))
    } else {
        Err(SkipReason::OutOfRange { field, value })
    }
}

fn switch(field: &'static str, value: i32) -> Built {
    checked(field, value, matches!(value, 0 | 1))
}

pub fn power(value: i32) -> Built {
    switch("Pow", value)
}

pub fn mode(value: i32) -> Built {
    checked("Mod", value, (0..=4).contains(&value))
}

pub fn turbo(value: i32) -> Built {
    switch("Tur", value)
}

pub fn light(value: i32) -> Built {
    switch("Lig", value)
}

/// 7, 8 and 9 are not louvre positions.
pub fn swing_vertical(value: i32) -> Built {
    checked(
        "SwUpDn",
        value,
        (0..=6).contains(&value) || (10..=11).contains(&value),
    )
}

/// Picking a fan speed drops quiet, turbo and low-noise modes.
pub fn fan_speed(value: i32) -> Built {
    checked("WdSpd", value, (0..=5).contains(&value)).map(|p| {
        p.with("Quiet", 0).with("Tur", 0).with("NoiseSet", 0)
    })
}

pub fn air(value: i32) -> Built {
    switch("Air", value)
}

pub fn dry(value: i32) -> Built {
    switch("Blo", value)
}

pub fn health(value: i32) -> Built {
    switch("Health", value)
}

/// Power saving owns the fan: speed, quiet, turbo and both sleep flags are
/// cleared with it.
pub fn power_save(value: i32) -> Built {
    switch("SvSt", value).map(|p| {
        p.with("WdSpd", 0)
            .with("Quiet", 0)
            .with("Tur", 0)
            .with("SwhSlp", 0)
            .with("SlpMod", 0)
    })
}
