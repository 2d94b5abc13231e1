//! # Parameter Adjustment Policy
//!
//! Le regole pure che decidono il prossimo tentativo: passo di qualità,
//! taglio di durata e bitrate finale. Nessun I/O.

use crate::encoder::QualityLevel;
use crate::probe::MediaInfo;

/// First attempt sits in the middle of the VBR scale
pub const INITIAL_QUALITY: QualityLevel = QualityLevel::new(4);

/// Attempt counter bound for the VBR phase (initial attempt included)
pub const MAX_VBR_ATTEMPTS: u32 = 10;

/// Above `target * FAR_RATIO` the quality moves by two steps
pub const FAR_RATIO: f64 = 2.0;

pub const TRIM_MIN_QUALITY: QualityLevel = QualityLevel::new(7);
pub const TRIM_SIZE_RATIO: f64 = 1.5;
pub const TRIM_HEADROOM: f64 = 0.9;

pub const FALLBACK_HEADROOM: f64 = 1.5;
pub const FALLBACK_MIN_KBPS: u32 = 8;
/// Applied regardless of the source layout
pub const FALLBACK_CHANNELS: u8 = 1;

/// Next quality ordinal after an oversized attempt
pub fn next_quality(current: QualityLevel, size: u64, target: u64) -> QualityLevel {
    if size as f64 > target as f64 * FAR_RATIO {
        current.degrade(2)
    } else {
        current.degrade(1)
    }
}

/// Fraction of the duration to keep, when the trim condition holds
///
/// `quality` is the ordinal about to be used, `size` the last measurement.
pub fn trim_ratio(quality: QualityLevel, size: u64, target: u64) -> Option<f64> {
    if quality >= TRIM_MIN_QUALITY && size as f64 > target as f64 * TRIM_SIZE_RATIO {
        Some(target as f64 / size as f64 * TRIM_HEADROOM)
    } else {
        None
    }
}

/// Stop time in seconds for a trim ratio, if the source duration is usable
pub fn duration_cap(ratio: f64, info: Option<&MediaInfo>) -> Option<f64> {
    info.and_then(MediaInfo::duration_secs)
        .map(|duration| duration * ratio)
}

/// Constant bitrate for the final pass, in kbit/s
pub fn fallback_bitrate_kbps(target: u64) -> u32 {
    let target_kb = target as f64 / 1024.0;
    let kbps = (target_kb * 8.0 / FALLBACK_HEADROOM).floor();
    if kbps.is_finite() && kbps < u32::MAX as f64 {
        (kbps as u32).max(FALLBACK_MIN_KBPS)
    } else {
        u32::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KB: u64 = 1024;

    #[test]
    fn test_far_from_target_takes_two_steps() {
        // 400 KB against 50 KB
        assert_eq!(next_quality(INITIAL_QUALITY, 400 * KB, 50 * KB).value(), 6);
    }

    #[test]
    fn test_near_target_takes_one_step() {
        assert_eq!(next_quality(INITIAL_QUALITY, 150 * KB, 100 * KB).value(), 5);
        // exactly twice the target is still "near"
        assert_eq!(next_quality(INITIAL_QUALITY, 200 * KB, 100 * KB).value(), 5);
    }

    #[test]
    fn test_quality_never_exceeds_nine() {
        let mut quality = INITIAL_QUALITY;
        for _ in 0..20 {
            let next = next_quality(quality, 1_000 * KB, KB);
            assert!(next >= quality);
            quality = next;
        }
        assert_eq!(quality, QualityLevel::WORST);
    }

    #[test]
    fn test_trim_requires_low_quality_and_large_size() {
        assert_eq!(trim_ratio(QualityLevel::new(6), 200 * KB, 10 * KB), None);
        assert_eq!(trim_ratio(QualityLevel::new(7), 15 * KB, 10 * KB), None);

        let ratio = trim_ratio(QualityLevel::new(9), 200 * KB, 10 * KB).unwrap();
        assert!((ratio - 0.045).abs() < 1e-9);
    }

    #[test]
    fn test_duration_cap_shortens_the_source() {
        let info = MediaInfo {
            duration: Some("600.0".to_string()),
            ..Default::default()
        };
        for (size, target) in [(16 * KB, 10 * KB), (200 * KB, 10 * KB), (10_000 * KB, KB)] {
            let ratio = trim_ratio(QualityLevel::WORST, size, target).unwrap();
            let cap = duration_cap(ratio, Some(&info)).unwrap();
            assert!(cap > 0.0 && cap < 600.0);
        }
    }

    #[test]
    fn test_duration_cap_needs_duration() {
        assert_eq!(duration_cap(0.5, None), None);

        let unparsable = MediaInfo {
            duration: Some("N/A".to_string()),
            ..Default::default()
        };
        assert_eq!(duration_cap(0.5, Some(&unparsable)), None);
    }

    #[test]
    fn test_fallback_bitrate() {
        // 100 KB * 8 / 1.5 = 533.33
        assert_eq!(fallback_bitrate_kbps(100 * KB), 533);
        assert_eq!(fallback_bitrate_kbps(10 * KB), 53);
    }

    #[test]
    fn test_fallback_bitrate_floor() {
        assert_eq!(fallback_bitrate_kbps(1), FALLBACK_MIN_KBPS);
        assert_eq!(fallback_bitrate_kbps(KB), FALLBACK_MIN_KBPS);
        assert_eq!(fallback_bitrate_kbps(2 * KB), 10);
    }
}
