//! Demo fixtures: three accounts (one per role), a set of active disease
//! alerts, and a couple of forum posts. Seeding is idempotent; it checks
//! for the demo farmer before writing anything.

use std::sync::Arc;

use tracing::info;

use crate::alerts::{AlertError, AlertService, AlertSeverity, NewAlert};
use crate::auth::{AuthError, FarmType, NewUser, Role, SessionService, UserProfile};
use crate::community::{CommunityError, CommunityService, NewPost};

pub const DEMO_PASSWORD: &str = "password123";
pub const DEMO_FARMER_EMAIL: &str = "farmer@example.com";
pub const DEMO_VET_EMAIL: &str = "vet@example.com";
pub const DEMO_AUTHORITY_EMAIL: &str = "authority@example.com";

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Alert(#[from] AlertError),
    #[error(transparent)]
    Community(#[from] CommunityError),
}

/// Populate the store with demo data. Returns whether seeding ran; a
/// store that already holds the demo farmer is left untouched.
pub fn seed_demo_data(
    sessions: &Arc<SessionService>,
    alerts: &AlertService,
    community: &CommunityService,
) -> Result<bool, SeedError> {
    if sessions.login(DEMO_FARMER_EMAIL, DEMO_PASSWORD).is_ok() {
        info!("demo data already present, skipping seed");
        return Ok(false);
    }

    let farmer = register(
        sessions,
        NewUser {
            email: DEMO_FARMER_EMAIL.to_string(),
            password: DEMO_PASSWORD.to_string(),
            name: "Rajesh Kumar".to_string(),
            role: Role::Farmer,
            farm_type: Some(FarmType::Poultry),
            location: "Bangalore Rural, Karnataka".to_string(),
            language: "en".to_string(),
        },
    )?;
    let vet = register(
        sessions,
        NewUser {
            email: DEMO_VET_EMAIL.to_string(),
            password: DEMO_PASSWORD.to_string(),
            name: "Dr. Priya Sharma".to_string(),
            role: Role::Vet,
            farm_type: None,
            location: "Bangalore, Karnataka".to_string(),
            language: "en".to_string(),
        },
    )?;
    let authority = register(
        sessions,
        NewUser {
            email: DEMO_AUTHORITY_EMAIL.to_string(),
            password: DEMO_PASSWORD.to_string(),
            name: "Vikram Singh".to_string(),
            role: Role::Authority,
            farm_type: None,
            location: "Karnataka".to_string(),
            language: "en".to_string(),
        },
    )?;

    alerts.publish(
        &authority.id,
        authority.role,
        NewAlert {
            title: "African Swine Fever Alert - High Risk".to_string(),
            description: "Multiple ASF cases confirmed in nearby districts. Suspend pig \
                          transport and review farm-gate biosecurity immediately."
                .to_string(),
            severity: AlertSeverity::Critical,
            location: "Bangalore Rural, Karnataka".to_string(),
            farm_type: Some(FarmType::Pig),
        },
    )?;
    alerts.publish(
        &vet.id,
        vet.role,
        NewAlert {
            title: "Avian Influenza (H5N1) Advisory".to_string(),
            description: "Migratory-season advisory. Keep flocks housed and limit contact \
                          with wild birds."
                .to_string(),
            severity: AlertSeverity::Medium,
            location: "Karnataka".to_string(),
            farm_type: Some(FarmType::Poultry),
        },
    )?;
    alerts.publish(
        &vet.id,
        vet.role,
        NewAlert {
            title: "Newcastle Disease Outbreak".to_string(),
            description: "Confirmed outbreak in a neighbouring taluk. Verify vaccination \
                          records for all flocks."
                .to_string(),
            severity: AlertSeverity::High,
            location: "Mysore, Karnataka".to_string(),
            farm_type: Some(FarmType::Poultry),
        },
    )?;

    community.create(
        &farmer,
        NewPost {
            title: "Best practices for footbath maintenance?".to_string(),
            content: "How often should the disinfectant solution be changed for it to stay \
                      effective?"
                .to_string(),
            category: "diseaseControl".to_string(),
        },
    )?;
    community.create(
        &vet,
        NewPost {
            title: "Vaccination schedule reminder".to_string(),
            content: "A reminder to keep Newcastle and Gumboro boosters on schedule during \
                      the monsoon months."
                .to_string(),
            category: "animalHealth".to_string(),
        },
    )?;

    info!("seeded demo users, alerts, and community posts");
    Ok(true)
}

fn register(sessions: &Arc<SessionService>, user: NewUser) -> Result<UserProfile, SeedError> {
    let (profile, token) = sessions.register(user)?;
    sessions.logout(&token)?;
    Ok(profile)
}
