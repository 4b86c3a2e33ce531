use crate::settings;

/// Tuning shared by every world created from one kernel context.
///
/// `Default` mirrors the constants in [`settings`]; override individual fields with struct update
/// syntax when a scene needs different trade-offs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KernelConfig {
    /// Contact points kept per shape pair, deepest first.
    pub max_contacts: usize,
    /// Cell levels of the hashed broad phase, as powers of two.
    pub hash_min_level: i32,
    pub hash_max_level: i32,
    pub solver_iterations: u32,
    pub sor: f32,
    pub erp: f32,
    pub cfm: f32,
    pub contact_slop: f32,
    pub bounce_velocity: f32,
    pub sleep_linear_threshold: f32,
    pub sleep_angular_threshold: f32,
    pub sleep_steps: u32,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_contacts: settings::MAX_CONTACTS,
            hash_min_level: settings::HASH_MIN_LEVEL,
            hash_max_level: settings::HASH_MAX_LEVEL,
            solver_iterations: settings::SOLVER_ITERATIONS,
            sor: settings::SOLVER_SOR,
            erp: settings::DEFAULT_ERP,
            cfm: settings::DEFAULT_CFM,
            contact_slop: settings::CONTACT_SLOP,
            bounce_velocity: settings::BOUNCE_VELOCITY,
            sleep_linear_threshold: settings::SLEEP_LINEAR_THRESHOLD,
            sleep_angular_threshold: settings::SLEEP_ANGULAR_THRESHOLD,
            sleep_steps: settings::SLEEP_STEPS,
        }
    }
}

impl KernelConfig {
    /// Clamp fields into ranges the solver and broad phase can work with.
    ///
    /// Contacts are capped at [`settings::MAX_CONTACTS`], the hash level range is reordered if
    /// inverted, and iteration counts are at least one.
    pub fn sanitized(mut self) -> Self {
        self.max_contacts = self.max_contacts.clamp(1, settings::MAX_CONTACTS);
        if self.hash_min_level > self.hash_max_level {
            std::mem::swap(&mut self.hash_min_level, &mut self.hash_max_level);
        }
        self.solver_iterations = self.solver_iterations.max(1);
        self.erp = self.erp.clamp(0.0, 1.0);
        self.cfm = self.cfm.max(0.0);
        self.contact_slop = self.contact_slop.max(0.0);
        self.sleep_steps = self.sleep_steps.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_settings() {
        let c = KernelConfig::default();
        assert_eq!(c.max_contacts, 4);
        assert_eq!(c.hash_min_level, -4);
        assert_eq!(c.hash_max_level, 8);
    }

    #[test]
    fn sanitized_repairs_bad_values() {
        let c = KernelConfig {
            max_contacts: 64,
            hash_min_level: 5,
            hash_max_level: -2,
            solver_iterations: 0,
            erp: 3.0,
            ..KernelConfig::default()
        }
        .sanitized();
        assert_eq!(c.max_contacts, settings::MAX_CONTACTS);
        assert_eq!((c.hash_min_level, c.hash_max_level), (-2, 5));
        assert_eq!(c.solver_iterations, 1);
        assert_eq!(c.erp, 1.0);
    }
}
