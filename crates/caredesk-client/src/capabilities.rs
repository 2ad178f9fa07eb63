//! Role capability sets
//!
//! One discriminant-driven check shared by every dashboard, instead of
//! per-page role branching. The server enforces the same rules; this exists
//! so the dashboards can decide what to render before making a call.

use caredesk_db::Role;

/// Actions a dashboard can offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create, edit, and delete any user account
    ManageUsers,
    /// Book an appointment for oneself
    BookAppointment,
    /// Book an appointment on a patient's behalf
    BookForPatient,
    /// Change appointment status, schedule, or doctor assignment
    ManageAppointments,
    /// Remove an appointment entirely
    DeleteAppointment,
    /// Author a medical record
    AuthorRecord,
    /// Read medical records within one's own scope
    ViewRecords,
}

/// The capability set a role carries
pub fn capabilities(role: Role) -> &'static [Capability] {
    match role {
        Role::Admin => &[
            Capability::ManageUsers,
            Capability::BookForPatient,
            Capability::ManageAppointments,
            Capability::DeleteAppointment,
            Capability::ViewRecords,
        ],
        Role::Doctor => &[
            Capability::ManageAppointments,
            Capability::AuthorRecord,
            Capability::ViewRecords,
        ],
        Role::Patient => &[Capability::BookAppointment, Capability::ViewRecords],
    }
}

/// Check whether a role carries a capability
pub fn role_can(role: Role, capability: Capability) -> bool {
    capabilities(role).contains(&capability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_capabilities() {
        assert!(role_can(Role::Patient, Capability::BookAppointment));
        assert!(role_can(Role::Patient, Capability::ViewRecords));
        assert!(!role_can(Role::Patient, Capability::AuthorRecord));
        assert!(!role_can(Role::Patient, Capability::ManageUsers));
    }

    #[test]
    fn test_doctor_capabilities() {
        assert!(role_can(Role::Doctor, Capability::AuthorRecord));
        assert!(role_can(Role::Doctor, Capability::ManageAppointments));
        assert!(!role_can(Role::Doctor, Capability::DeleteAppointment));
        assert!(!role_can(Role::Doctor, Capability::ManageUsers));
    }

    #[test]
    fn test_admin_capabilities() {
        assert!(role_can(Role::Admin, Capability::ManageUsers));
        assert!(role_can(Role::Admin, Capability::DeleteAppointment));
        assert!(role_can(Role::Admin, Capability::BookForPatient));
        // Admins are not clinicians
        assert!(!role_can(Role::Admin, Capability::AuthorRecord));
    }
}
