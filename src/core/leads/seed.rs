use super::auth::normalize_email;
use super::types::{Collection, Lead, LeadBase, LeadStatus, Profile, Role, now_millis};

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@leadrelay.local";
pub const DEFAULT_ADMIN_NAME: &str = "Admin Master";

/// Add the admin profile unless a profile with that e-mail already exists.
pub fn ensure_admin(collection: &mut Collection, email: &str, name: &str) -> anyhow::Result<Profile> {
    let email = normalize_email(email)?;
    if let Some(existing) = collection.find_profile_by_email(&email) {
        return Ok(existing.clone());
    }
    let admin = Profile {
        id: format!("admin-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]),
        name: name.trim().to_string(),
        email,
        role: Role::Admin,
        active: true,
    };
    collection.profiles.push(admin.clone());
    Ok(admin)
}

/// Two agents, one campaign and a pending lead for each agent.
pub fn seed_demo(collection: &mut Collection) {
    let now = now_millis();
    let agents = [
        ("seller-1", "João Vendedor", "joao@leadrelay.local"),
        ("seller-2", "Maria Seller", "maria@leadrelay.local"),
    ];
    for (id, name, email) in agents {
        if collection.find_profile_by_email(email).is_none() {
            collection.profiles.push(Profile {
                id: id.to_string(),
                name: name.to_string(),
                email: email.to_string(),
                role: Role::Agent,
                active: true,
            });
        }
    }

    if collection.find_base("base-demo").is_some() {
        return;
    }
    collection.bases.push(LeadBase {
        id: "base-demo".to_string(),
        name: "Lançamento Mentorias".to_string(),
        copy: "Olá [NOME], vi seu interesse no curso!".to_string(),
        image: None,
        created_at: now,
    });
    let leads = [
        ("lead-demo-1", "seller-1", "Lucas Silva", "5511999999999"),
        ("lead-demo-2", "seller-2", "Fernanda Lima", "5511888888888"),
    ];
    for (id, seller, name, phone) in leads {
        collection.leads.push(Lead {
            id: id.to_string(),
            base_id: "base-demo".to_string(),
            seller_id: seller.to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            status: LeadStatus::Pending,
            sent_at: None,
            created_at: now,
        });
    }
}
