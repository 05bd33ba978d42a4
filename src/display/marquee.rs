//! Pause-slide-pause-slide scrolling for text wider than its column.
//!
//! The offset is a pure function of the frame counter, so any frame of the
//! animation can be reproduced by passing the same counter.

/// Timing of one marquee cycle, in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarqueeParams {
    pub pause_frames: u32,
    pub cycle_duration: u32,
    /// Extra pixels slid past the end of the text.
    pub margin: u32,
}

impl MarqueeParams {
    /// Frames spent in each of the two sliding phases.
    pub fn slide_frames(&self) -> u32 {
        self.cycle_duration.saturating_sub(2 * self.pause_frames) / 2
    }
}

impl Default for MarqueeParams {
    fn default() -> Self {
        Self {
            pause_frames: 30,
            cycle_duration: 120,
            margin: 5,
        }
    }
}

/// Horizontal shift, in pixels, for text `text_width` wide shown in
/// `available_width` at `frame_counter`.
///
/// Text that fits never moves. Otherwise, per cycle: hold at 0, ramp to the
/// slide distance, hold there, ramp back. Ramps are linear and floored.
pub fn offset(
    text_width: u32,
    available_width: u32,
    frame_counter: u64,
    params: &MarqueeParams,
) -> u32 {
    if text_width <= available_width || params.cycle_duration == 0 {
        return 0;
    }

    let distance = u64::from(text_width - available_width) + u64::from(params.margin);
    let pause = u64::from(params.pause_frames);
    let slide = u64::from(params.slide_frames());
    let phase = frame_counter % u64::from(params.cycle_duration);

    let shift = if phase < pause {
        0
    } else if phase < pause + slide {
        (phase - pause) * distance / slide
    } else if phase < 2 * pause + slide {
        distance
    } else if slide == 0 {
        0
    } else {
        let progress = phase - (2 * pause + slide);
        // floor(distance - progress * distance / slide)
        distance.saturating_sub((progress * distance).div_ceil(slide))
    };

    u32::try_from(shift).unwrap_or(u32::MAX)
}

/// Per-loop animation context handed to every render call.
///
/// The counter advances once per rendered frame and wraps at the cycle length,
/// so it never grows without bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationState {
    frame_counter: u64,
    cycle: u64,
}

impl AnimationState {
    pub fn new(params: &MarqueeParams) -> Self {
        Self {
            frame_counter: 0,
            cycle: u64::from(params.cycle_duration),
        }
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn advance(&mut self) {
        self.frame_counter = if self.cycle == 0 {
            0
        } else {
            (self.frame_counter + 1) % self.cycle
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: MarqueeParams = MarqueeParams {
        pause_frames: 30,
        cycle_duration: 120,
        margin: 5,
    };

    #[test]
    fn test_short_text_never_moves() {
        for frame in 0..500 {
            assert_eq!(offset(28, 28, frame, &P), 0);
            assert_eq!(offset(10, 28, frame, &P), 0);
        }
    }

    #[test]
    fn test_offset_is_deterministic() {
        for frame in [0, 17, 45, 61, 99, 119, 120, 10_001] {
            assert_eq!(offset(60, 28, frame, &P), offset(60, 28, frame, &P));
        }
        assert_eq!(offset(60, 28, 45, &P), offset(60, 28, 45 + 120 * 7, &P));
    }

    #[test]
    fn test_cycle_phases() {
        // distance = 60 - 28 + 5 = 37, slide frames = 30
        let d = 37;
        assert_eq!(offset(60, 28, 0, &P), 0);
        assert_eq!(offset(60, 28, 29, &P), 0);
        assert_eq!(offset(60, 28, 30, &P), 0);
        assert_eq!(offset(60, 28, 45, &P), 15 * d / 30);
        assert_eq!(offset(60, 28, 60, &P), d);
        assert_eq!(offset(60, 28, 89, &P), d);
        assert_eq!(offset(60, 28, 90, &P), d);
        assert_eq!(offset(60, 28, 119, &P), 1);
        assert_eq!(offset(60, 28, 120, &P), 0);
    }

    #[test]
    fn test_slide_back_floors() {
        // distance 17 over 30 frames: halfway back is floor(17 - 8.5) = 8
        assert_eq!(offset(40, 28, 105, &P), 8);
    }

    #[test]
    fn test_offset_bounded_by_distance() {
        let d = 60 - 28 + 5;
        for frame in 0..240 {
            assert!(offset(60, 28, frame, &P) <= d);
        }
    }

    #[test]
    fn test_forward_ramp_is_monotonic() {
        let mut last = 0;
        for frame in 30..60 {
            let o = offset(80, 28, frame, &P);
            assert!(o >= last);
            last = o;
        }
    }

    #[test]
    fn test_degenerate_params_do_not_panic() {
        let zero = MarqueeParams {
            pause_frames: 0,
            cycle_duration: 0,
            margin: 5,
        };
        assert_eq!(offset(60, 28, 7, &zero), 0);

        let all_pause = MarqueeParams {
            pause_frames: 60,
            cycle_duration: 100,
            margin: 5,
        };
        assert_eq!(all_pause.slide_frames(), 0);
        for frame in 0..200 {
            assert!(offset(60, 28, frame, &all_pause) <= 37);
        }
    }

    #[test]
    fn test_animation_state_wraps() {
        let mut state = AnimationState::new(&P);
        for _ in 0..119 {
            state.advance();
        }
        assert_eq!(state.frame_counter(), 119);
        state.advance();
        assert_eq!(state.frame_counter(), 0);
    }
}
