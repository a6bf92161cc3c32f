// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Role-based access control.
//
// One static table maps each role to its landing route, the routes it may
// open, the operations it may perform, how much of the document set it can
// see, and which roles it may register.  `authorize` is the single check
// every service operation goes through.

use std::fmt;
use std::str::FromStr;

use docurex_core::error::{DocurexError, Result};
use docurex_core::types::{Document, Role, User};
use tracing::debug;

/// Navigable sections of the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    AdminDashboard,
    DoctorDashboard,
    PatientDashboard,
    Documents,
    Upload,
    CreatePatient,
    ManageUsers,
    Verify,
    AiAssistant,
    AuditLog,
}

impl Route {
    pub const ALL: [Route; 10] = [
        Route::AdminDashboard,
        Route::DoctorDashboard,
        Route::PatientDashboard,
        Route::Documents,
        Route::Upload,
        Route::CreatePatient,
        Route::ManageUsers,
        Route::Verify,
        Route::AiAssistant,
        Route::AuditLog,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::AdminDashboard => "/admin-dashboard",
            Self::DoctorDashboard => "/doctor-dashboard",
            Self::PatientDashboard => "/patient-dashboard",
            Self::Documents => "/documents",
            Self::Upload => "/upload",
            Self::CreatePatient => "/create-patient",
            Self::ManageUsers => "/manage-users",
            Self::Verify => "/verify",
            Self::AiAssistant => "/ai-assistant",
            Self::AuditLog => "/audit-log",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = DocurexError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('/');
        Route::ALL
            .into_iter()
            .find(|r| r.path().trim_start_matches('/') == wanted)
            .ok_or_else(|| DocurexError::UnknownValue(format!("route '{s}'")))
    }
}

/// Operations guarded by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewDocuments,
    ViewLedger,
    UploadDocument,
    VerifyDocument,
    CheckFile,
    RegisterUser,
    ListPatients,
    ListUsers,
    ViewAuditLog,
    ViewDashboardStats,
    UseAssistant,
}

impl Permission {
    fn describe(&self) -> &'static str {
        match self {
            Self::ViewDocuments => "view documents",
            Self::ViewLedger => "view the ledger",
            Self::UploadDocument => "upload documents",
            Self::VerifyDocument => "verify documents",
            Self::CheckFile => "check files against the ledger",
            Self::RegisterUser => "register users",
            Self::ListPatients => "list patients",
            Self::ListUsers => "list users",
            Self::ViewAuditLog => "view the audit log",
            Self::ViewDashboardStats => "view dashboard statistics",
            Self::UseAssistant => "use the AI assistant",
        }
    }
}

/// How much of the document set a role sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    All,
    /// Only documents whose `patient_id` is the viewer's own id.
    OwnRecords,
}

/// Everything the portal needs to know about one role.
#[derive(Debug)]
pub struct RolePolicy {
    pub role: Role,
    pub home: Route,
    pub routes: &'static [Route],
    pub permissions: &'static [Permission],
    pub visibility: Visibility,
    pub registrable: &'static [Role],
}

static POLICIES: [RolePolicy; 5] = [
    RolePolicy {
        role: Role::Admin,
        home: Route::AdminDashboard,
        routes: &[
            Route::AdminDashboard,
            Route::Documents,
            Route::ManageUsers,
            Route::AuditLog,
        ],
        permissions: &[
            Permission::ViewDocuments,
            Permission::ViewLedger,
            Permission::VerifyDocument,
            Permission::CheckFile,
            Permission::RegisterUser,
            Permission::ListPatients,
            Permission::ListUsers,
            Permission::ViewAuditLog,
            Permission::ViewDashboardStats,
        ],
        visibility: Visibility::All,
        registrable: &Role::ALL,
    },
    RolePolicy {
        role: Role::Doctor,
        home: Route::DoctorDashboard,
        routes: &[
            Route::DoctorDashboard,
            Route::Documents,
            Route::Upload,
            Route::CreatePatient,
            Route::AiAssistant,
        ],
        permissions: &[
            Permission::ViewDocuments,
            Permission::ViewLedger,
            Permission::UploadDocument,
            Permission::CheckFile,
            Permission::RegisterUser,
            Permission::ListPatients,
            Permission::UseAssistant,
        ],
        visibility: Visibility::All,
        registrable: &[Role::Patient],
    },
    RolePolicy {
        role: Role::Patient,
        home: Route::PatientDashboard,
        routes: &[
            Route::PatientDashboard,
            Route::Documents,
            Route::Verify,
            Route::AiAssistant,
        ],
        permissions: &[
            Permission::ViewDocuments,
            Permission::ViewLedger,
            Permission::CheckFile,
            Permission::UseAssistant,
        ],
        visibility: Visibility::OwnRecords,
        registrable: &[],
    },
    RolePolicy {
        role: Role::Researcher,
        home: Route::Documents,
        routes: &[Route::Documents, Route::Verify, Route::AiAssistant],
        permissions: &[
            Permission::ViewDocuments,
            Permission::ViewLedger,
            Permission::CheckFile,
            Permission::UseAssistant,
        ],
        visibility: Visibility::All,
        registrable: &[],
    },
    RolePolicy {
        role: Role::Auditor,
        home: Route::AuditLog,
        routes: &[Route::Documents, Route::Verify, Route::AuditLog],
        permissions: &[
            Permission::ViewDocuments,
            Permission::ViewLedger,
            Permission::CheckFile,
            Permission::ViewAuditLog,
        ],
        visibility: Visibility::All,
        registrable: &[],
    },
];

/// Policy row for `role`.
pub fn policy_for(role: Role) -> &'static RolePolicy {
    match role {
        Role::Admin => &POLICIES[0],
        Role::Doctor => &POLICIES[1],
        Role::Patient => &POLICIES[2],
        Role::Researcher => &POLICIES[3],
        Role::Auditor => &POLICIES[4],
    }
}

/// Fail with `Forbidden` unless `user`'s role grants `permission`.
pub fn authorize(user: &User, permission: Permission) -> Result<()> {
    if policy_for(user.role).permissions.contains(&permission) {
        Ok(())
    } else {
        debug!(user = %user.id, role = %user.role, ?permission, "permission denied");
        Err(DocurexError::Forbidden {
            role: user.role,
            action: permission.describe().to_owned(),
        })
    }
}

/// Fail unless `creator` may register an account with role `new_role`.
pub fn authorize_registration(creator: &User, new_role: Role) -> Result<()> {
    authorize(creator, Permission::RegisterUser)?;
    if policy_for(creator.role).registrable.contains(&new_role) {
        Ok(())
    } else {
        Err(DocurexError::Forbidden {
            role: creator.role,
            action: format!("register {new_role} accounts"),
        })
    }
}

/// Landing route after sign-in.
pub fn home_route(role: Role) -> Route {
    policy_for(role).home
}

pub fn can_access_route(user: &User, route: Route) -> bool {
    policy_for(user.role).routes.contains(&route)
}

/// Documents `user` may see: everything for staff roles, only their own
/// records for patients.
pub fn visible_documents(user: &User, documents: &[Document]) -> Vec<Document> {
    match policy_for(user.role).visibility {
        Visibility::All => documents.to_vec(),
        Visibility::OwnRecords => documents
            .iter()
            .filter(|d| d.patient_id == user.id)
            .cloned()
            .collect(),
    }
}
