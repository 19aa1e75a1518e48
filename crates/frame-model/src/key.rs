//! Frame identity keys.

/// Suffix appended to keys of frames with a zoom transform in effect.
pub const ZOOM_SUFFIX: &str = "-z";

/// Number of decimals kept from the frame number.
pub const KEY_PRECISION: usize = 6;

/// Format the identity key for a frame.
///
/// The key is `"{source_id}-{frame_number}"` with the frame number written
/// with six decimals, followed by [`ZOOM_SUFFIX`] when `has_zoom` is set.
/// Frame numbers closer than `1e-6` may produce the same key.
pub fn format_key(source_id: &str, frame_number: f64, has_zoom: bool) -> String {
    let suffix = if has_zoom { ZOOM_SUFFIX } else { "" };
    format!("{source_id}-{frame_number:.prec$}{suffix}", prec = KEY_PRECISION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(format_key("clip.mp4", 12.0, false), "clip.mp4-12.000000");
        assert_eq!(format_key("clip.mp4", 12.5, true), "clip.mp4-12.500000-z");
    }

    #[test]
    fn test_zoom_flag_changes_key() {
        assert_ne!(
            format_key("clip.mp4", 3.25, false),
            format_key("clip.mp4", 3.25, true)
        );
    }

    #[test]
    fn test_sub_precision_numbers_collide() {
        assert_eq!(
            format_key("clip.mp4", 1.000_000_1, false),
            format_key("clip.mp4", 1.000_000_2, false)
        );
        assert_ne!(
            format_key("clip.mp4", 1.000_001, false),
            format_key("clip.mp4", 1.000_002, false)
        );
    }
}
