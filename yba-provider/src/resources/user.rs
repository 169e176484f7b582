//! yba_user - customer users

use std::collections::HashMap;

use tracing::info;
use yba_core::provider::ProviderResult;
use yba_core::resource::{Resource, ResourceId, State, Value};

use super::{Attrs, existing, identifier, insert_opt, string};
use crate::models::{User, UserRegistration};
use crate::provider::YbaProvider;

fn user_attributes(user: &User) -> HashMap<String, Value> {
    let mut attributes = HashMap::from([
        ("email".to_string(), string(&user.email)),
        ("role".to_string(), string(&user.role)),
        ("is_primary".to_string(), Value::Bool(user.is_primary)),
    ]);
    insert_opt(&mut attributes, "creation_date", user.creation_date.as_deref().map(string));
    attributes
}

impl YbaProvider {
    pub(crate) async fn create_user(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = Attrs::new(&resource.id, &resource.attributes);
        let password = attrs.str("password")?;
        let registration = UserRegistration {
            email: attrs.str("email")?,
            confirm_password: password.clone(),
            password,
            role: attrs.str("role")?,
        };

        let user = self.api.create_user(&registration).await?;
        info!(user_uuid = %user.uuid, email = %user.email, "created user");
        Ok(existing(&resource.id, &user.uuid, user_attributes(&user)))
    }

    pub(crate) async fn read_user(&self, id: &ResourceId, prior: &State) -> ProviderResult<State> {
        let uuid = identifier(prior)?;
        let user = self.api.get_user(uuid).await?;
        Ok(existing(id, uuid, user_attributes(&user)))
    }

    /// Only the role can change in place
    pub(crate) async fn update_user(&self, from: &State, to: &Resource) -> ProviderResult<State> {
        let uuid = identifier(from)?;
        let role = Attrs::new(&to.id, &to.attributes).str("role")?;

        self.api.update_user_role(uuid, &role).await?;
        info!(user_uuid = %uuid, role = %role, "updated user role");
        self.read_user(&to.id, from).await
    }

    pub(crate) async fn delete_user(&self, state: &State) -> ProviderResult<()> {
        let uuid = identifier(state)?;
        self.api.delete_user(uuid).await?;
        info!(user_uuid = %uuid, "deleted user");
        Ok(())
    }
}
