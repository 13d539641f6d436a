//! SysTick clock configuration

use m4_core::{CtlError, CtlResult};

/// Largest value the 24-bit `SYST_RVR` register holds
pub const MAX_RELOAD: u32 = 0x00FF_FFFF;

/// Clock feeding the SysTick counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// Processor clock (`CLKSOURCE = 1`)
    Processor,
    /// Implementation-defined reference clock (`CLKSOURCE = 0`); PIOSC/4 on
    /// TM4C parts
    External,
}

/// Timer configuration fixed for the lifetime of a [`SysTick`](crate::SysTick)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysTickConfig {
    /// Frequency of the selected clock in hertz
    pub clock_hz: u32,
    /// Counter clock
    pub clock_source: ClockSource,
}

impl SysTickConfig {
    /// 16 MHz processor clock
    pub const DEFAULT: SysTickConfig = SysTickConfig {
        clock_hz: 16_000_000,
        clock_source: ClockSource::Processor,
    };

    /// Start from the 16 MHz processor clock and override from there
    pub const fn builder() -> SysTickConfigBuilder {
        SysTickConfigBuilder {
            config: Self::DEFAULT,
        }
    }

    /// Counter ticks per millisecond
    pub const fn ticks_per_ms(&self) -> u32 {
        self.clock_hz / 1_000
    }

    /// Reload value that makes one countdown last `duration_ms`.
    ///
    /// Zero durations and durations whose reload exceeds [`MAX_RELOAD`] are
    /// rejected rather than truncated. A clock slower than 1 kHz cannot time
    /// any whole millisecond and rejects every duration.
    pub const fn reload_for(&self, duration_ms: u32) -> CtlResult<u32> {
        let ticks = match self.ticks_per_ms().checked_mul(duration_ms) {
            Some(ticks) => ticks,
            None => return Err(CtlError::DurationOutOfRange(duration_ms)),
        };
        match ticks.checked_sub(1) {
            Some(reload) if reload <= MAX_RELOAD => Ok(reload),
            _ => Err(CtlError::DurationOutOfRange(duration_ms)),
        }
    }

    /// Longest duration a single countdown can time
    pub const fn max_duration_ms(&self) -> u32 {
        match self.ticks_per_ms() {
            0 => 0,
            ticks => (MAX_RELOAD + 1) / ticks,
        }
    }
}

impl Default for SysTickConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Step-by-step [`SysTickConfig`] for boards not running at 16 MHz
#[derive(Debug, Clone, Copy)]
pub struct SysTickConfigBuilder {
    config: SysTickConfig,
}

impl SysTickConfigBuilder {
    /// Frequency of the clock the counter will run from
    pub const fn clock_hz(mut self, hz: u32) -> Self {
        self.config.clock_hz = hz;
        self
    }

    /// Processor or reference clock
    pub const fn clock_source(mut self, source: ClockSource) -> Self {
        self.config.clock_source = source;
        self
    }

    /// Freeze the timer settings
    pub const fn build(self) -> SysTickConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reload() {
        let config = SysTickConfig::DEFAULT;
        assert_eq!(config.ticks_per_ms(), 16_000);
        assert_eq!(config.reload_for(10), Ok(159_999));
        assert_eq!(config.reload_for(1), Ok(15_999));
    }

    #[test]
    fn test_reload_bounds() {
        let config = SysTickConfig::DEFAULT;
        assert_eq!(config.max_duration_ms(), 1_048);
        assert_eq!(config.reload_for(1_048), Ok(16_767_999));
        assert_eq!(config.reload_for(1_049), Err(CtlError::DurationOutOfRange(1_049)));
        assert_eq!(config.reload_for(0), Err(CtlError::DurationOutOfRange(0)));
        assert_eq!(
            config.reload_for(u32::MAX),
            Err(CtlError::DurationOutOfRange(u32::MAX))
        );
    }

    #[test]
    fn test_builder() {
        let config = SysTickConfig::builder()
            .clock_hz(4_000_000)
            .clock_source(ClockSource::External)
            .build();

        assert_eq!(config.clock_source, ClockSource::External);
        assert_eq!(config.reload_for(2), Ok(7_999));
        assert_eq!(config.max_duration_ms(), 4_194);
    }

    #[test]
    fn test_slow_clock_rejects_everything() {
        let config = SysTickConfig::builder().clock_hz(500).build();
        assert_eq!(config.max_duration_ms(), 0);
        assert!(config.reload_for(1).is_err());
    }
}
