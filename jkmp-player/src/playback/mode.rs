//! Playback mode policy
//!
//! Pure resolution of "what plays next" from the mode, direction, current
//! index and playlist length. The orchestrator turns the resulting [`Step`]
//! into transport commands.

use jkmp_common::events::PlaybackMode;
use rand::Rng;

/// Outcome of an advance request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Select the track at this index
    Play(usize),
    /// Seek to 0 and reload the current track
    Restart,
    /// Sequential end of list: pause, pointer unchanged
    Halt,
    /// Nothing to do (empty list, or previous from the first track)
    Stay,
}

pub fn resolve<R: Rng + ?Sized>(
    mode: PlaybackMode,
    is_next: bool,
    current: Option<usize>,
    len: usize,
    rng: &mut R,
) -> Step {
    if len == 0 {
        return Step::Stay;
    }
    let last = len - 1;
    let current = current.filter(|i| *i < len);

    match mode {
        PlaybackMode::Sequential => match (current, is_next) {
            (None, true) => Step::Play(0),
            (None, false) => Step::Stay,
            (Some(i), true) if i == last => Step::Halt,
            (Some(i), true) => Step::Play(i + 1),
            (Some(0), false) => Step::Stay,
            (Some(i), false) => Step::Play(i - 1),
        },
        PlaybackMode::SequentialLoop => match (current, is_next) {
            (None, true) => Step::Play(0),
            (None, false) => Step::Play(last),
            (Some(i), true) if i == last => Step::Play(0),
            (Some(i), true) => Step::Play(i + 1),
            (Some(0), false) => Step::Play(last),
            (Some(i), false) => Step::Play(i - 1),
        },
        PlaybackMode::SingleLoop => match current {
            Some(_) => Step::Restart,
            None => Step::Play(0),
        },
        PlaybackMode::Shuffle => Step::Play(shuffle_index(current, len, rng)),
    }
}

/// Uniform over the indices other than `current`
///
/// Equivalent to resampling until there is no collision, without the loop.
fn shuffle_index<R: Rng + ?Sized>(current: Option<usize>, len: usize, rng: &mut R) -> usize {
    match current {
        _ if len == 1 => 0,
        None => rng.gen_range(0..len),
        Some(current) => {
            let pick = rng.gen_range(0..len - 1);
            if pick >= current {
                pick + 1
            } else {
                pick
            }
        }
    }
}

/// Mode used by the explicit next/previous controls
pub fn for_skip(mode: PlaybackMode) -> PlaybackMode {
    match mode {
        PlaybackMode::Shuffle => PlaybackMode::Shuffle,
        _ => PlaybackMode::SequentialLoop,
    }
}

/// Mode used when a load error advances; repeating a failing track is pointless
pub fn for_error(mode: PlaybackMode) -> PlaybackMode {
    match mode {
        PlaybackMode::SingleLoop => PlaybackMode::Sequential,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_sequential() {
        let mut rng = rng();
        let mode = PlaybackMode::Sequential;
        assert_eq!(resolve(mode, true, Some(1), 3, &mut rng), Step::Play(2));
        assert_eq!(resolve(mode, true, Some(2), 3, &mut rng), Step::Halt);
        assert_eq!(resolve(mode, false, Some(2), 3, &mut rng), Step::Play(1));
        assert_eq!(resolve(mode, false, Some(0), 3, &mut rng), Step::Stay);
        assert_eq!(resolve(mode, true, None, 3, &mut rng), Step::Play(0));
        assert_eq!(resolve(mode, false, None, 3, &mut rng), Step::Stay);
    }

    #[test]
    fn test_sequential_loop_wraps_both_ways() {
        let mut rng = rng();
        let mode = PlaybackMode::SequentialLoop;
        assert_eq!(resolve(mode, true, Some(2), 3, &mut rng), Step::Play(0));
        assert_eq!(resolve(mode, false, Some(0), 3, &mut rng), Step::Play(2));
        assert_eq!(resolve(mode, false, None, 3, &mut rng), Step::Play(2));
    }

    #[test]
    fn test_sequential_loop_returns_to_start_after_n_steps() {
        let mut rng = rng();
        let len = 5;
        for start in 0..len {
            let mut index = start;
            for _ in 0..len {
                match resolve(PlaybackMode::SequentialLoop, true, Some(index), len, &mut rng) {
                    Step::Play(next) => index = next,
                    other => panic!("unexpected step {:?}", other),
                }
            }
            assert_eq!(index, start);
        }
    }

    #[test]
    fn test_single_loop_restarts() {
        let mut rng = rng();
        for is_next in [true, false] {
            assert_eq!(
                resolve(PlaybackMode::SingleLoop, is_next, Some(1), 3, &mut rng),
                Step::Restart
            );
        }
    }

    #[test]
    fn test_shuffle_never_repeats_current() {
        let mut rng = rng();
        for current in 0..4 {
            for _ in 0..200 {
                match resolve(PlaybackMode::Shuffle, true, Some(current), 4, &mut rng) {
                    Step::Play(i) => {
                        assert_ne!(i, current);
                        assert!(i < 4);
                    }
                    other => panic!("unexpected step {:?}", other),
                }
            }
        }
    }

    #[test]
    fn test_shuffle_reaches_every_other_index() {
        let mut rng = rng();
        let mut seen = [false; 4];
        for _ in 0..400 {
            if let Step::Play(i) = resolve(PlaybackMode::Shuffle, false, Some(0), 4, &mut rng) {
                seen[i] = true;
            }
        }
        assert_eq!(seen, [false, true, true, true]);
    }

    #[test]
    fn test_shuffle_single_track() {
        let mut rng = rng();
        assert_eq!(resolve(PlaybackMode::Shuffle, true, Some(0), 1, &mut rng), Step::Play(0));
    }

    #[test]
    fn test_empty_playlist_stays() {
        let mut rng = rng();
        for mode in PlaybackMode::ALL {
            assert_eq!(resolve(mode, true, None, 0, &mut rng), Step::Stay);
        }
    }

    #[test]
    fn test_coercions() {
        assert_eq!(for_skip(PlaybackMode::Sequential), PlaybackMode::SequentialLoop);
        assert_eq!(for_skip(PlaybackMode::SingleLoop), PlaybackMode::SequentialLoop);
        assert_eq!(for_skip(PlaybackMode::Shuffle), PlaybackMode::Shuffle);
        assert_eq!(for_error(PlaybackMode::SingleLoop), PlaybackMode::Sequential);
        assert_eq!(for_error(PlaybackMode::Shuffle), PlaybackMode::Shuffle);
    }
}
