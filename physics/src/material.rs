//! Surface parameter combination for contacts between two colliders.

/// Keep only usable overrides: negative values mean "combine from the colliders".
#[inline]
fn usable(value: Option<f32>) -> Option<f32> {
    value.filter(|v| *v >= 0.0)
}

/// Combined friction: the override if given, else the geometric mean of both colliders.
pub fn combine_friction(a: f32, b: f32, override_value: Option<f32>) -> f32 {
    usable(override_value).unwrap_or_else(|| (a * b).sqrt())
}

/// Combined restitution: the override if given, else the bouncier of both colliders.
pub fn combine_restitution(a: f32, b: f32, override_value: Option<f32>) -> f32 {
    usable(override_value).unwrap_or_else(|| a.max(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn friction_is_geometric_mean() {
        assert_relative_eq!(combine_friction(0.25, 1.0, None), 0.5);
        assert_relative_eq!(combine_friction(0.0, 1.0, None), 0.0);
        assert_eq!(combine_friction(f32::INFINITY, 2.0, None), f32::INFINITY);
    }

    #[test]
    fn restitution_takes_max() {
        assert_eq!(combine_restitution(0.2, 0.7, None), 0.7);
    }

    #[test]
    fn non_negative_overrides_win() {
        assert_eq!(combine_friction(0.25, 1.0, Some(0.0)), 0.0);
        assert_eq!(combine_friction(0.25, 1.0, Some(3.0)), 3.0);
        assert_eq!(combine_restitution(0.2, 0.7, Some(0.1)), 0.1);
    }

    #[test]
    fn negative_overrides_are_ignored() {
        assert_relative_eq!(combine_friction(0.25, 1.0, Some(-1.0)), 0.5);
        assert_eq!(combine_restitution(0.2, 0.7, Some(-0.5)), 0.7);
    }
}
