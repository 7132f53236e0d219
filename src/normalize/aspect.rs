//! Display aspect ratio labels.

/// Reduced ratios with a conventional name.
const CANONICAL: &[((u64, u64), &str)] = &[
    ((16, 9), "16:9"),
    ((64, 36), "16:9"),
    ((4, 3), "4:3"),
    ((16, 12), "4:3"),
    ((21, 9), "21:9"),
    ((7, 3), "21:9"),
];

/// Cinema ratios matched on the raw `width / height` value.
const BUCKETS: &[(f64, &str)] = &[
    (2.35, "2.35:1"),
    (2.39, "2.39:1"),
    (1.85, "1.85:1"),
    (1.78, "16:9"),
];

const BUCKET_TOLERANCE: f64 = 0.1;

/// Label for a `width × height` frame.
///
/// The ratio is reduced by GCD and checked against [`CANONICAL`]; failing
/// that, the nearest [`BUCKETS`] entry within tolerance wins; failing that,
/// the reduced fraction itself is returned. Zero dimensions yield `None`.
pub fn aspect_ratio(width: u64, height: u64) -> Option<String> {
    if width == 0 || height == 0 {
        return None;
    }

    let divisor = gcd(width, height);
    let reduced = (width / divisor, height / divisor);

    if let Some((_, label)) = CANONICAL.iter().find(|(ratio, _)| *ratio == reduced) {
        return Some((*label).to_string());
    }

    let raw = width as f64 / height as f64;
    let nearest = BUCKETS
        .iter()
        .map(|(target, label)| ((raw - target).abs(), *label))
        .filter(|(distance, _)| *distance < BUCKET_TOLERANCE)
        .min_by(|a, b| a.0.total_cmp(&b.0));
    if let Some((_, label)) = nearest {
        return Some(label.to_string());
    }

    Some(format!("{}:{}", reduced.0, reduced.1))
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_ratios() {
        assert_eq!(aspect_ratio(1920, 1080).as_deref(), Some("16:9"));
        assert_eq!(aspect_ratio(3840, 2160).as_deref(), Some("16:9"));
        assert_eq!(aspect_ratio(1440, 1080).as_deref(), Some("4:3"));
        assert_eq!(aspect_ratio(2520, 1080).as_deref(), Some("21:9"));
    }

    #[test]
    fn test_uncanonical_reduced_fraction() {
        assert_eq!(aspect_ratio(720, 480).as_deref(), Some("3:2"));
        assert_eq!(aspect_ratio(1000, 1000).as_deref(), Some("1:1"));
    }

    #[test]
    fn test_scope_buckets() {
        assert_eq!(aspect_ratio(1920, 800).as_deref(), Some("2.39:1"));
        assert_eq!(aspect_ratio(1920, 817).as_deref(), Some("2.35:1"));
        assert_eq!(aspect_ratio(1998, 1080).as_deref(), Some("1.85:1"));
        assert_eq!(aspect_ratio(1280, 718).as_deref(), Some("16:9"));
    }

    #[test]
    fn test_zero_dimension() {
        assert_eq!(aspect_ratio(0, 1080), None);
        assert_eq!(aspect_ratio(1920, 0), None);
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(1920, 1080), 120);
        assert_eq!(gcd(7, 3), 1);
    }
}
