//! Users and their profiles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::order::{Order, OrderForm};
use crate::domain::value_objects::validate_country_code;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_superuser: bool,
    #[serde(skip_serializing)]
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn register(username: impl Into<String>, email: impl Into<String>, is_superuser: bool) -> Self {
        Self {
            id: Uuid::now_v7(), username: username.into(), email: email.into(), is_superuser,
            token: Uuid::new_v4().simple().to_string(), created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct RegistrationForm {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(email, length(max = 254))]
    pub email: String,
}

/// Default delivery information and order history anchor for a user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub default_phone_number: Option<String>,
    pub default_country: Option<String>,
    pub default_postcode: Option<String>,
    pub default_town_or_city: Option<String>,
    pub default_street_address1: Option<String>,
    pub default_street_address2: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct ProfileForm {
    #[validate(length(max = 20))]
    pub default_phone_number: Option<String>,
    #[validate(custom = "validate_country_code")]
    pub default_country: Option<String>,
    #[validate(length(max = 20))]
    pub default_postcode: Option<String>,
    #[validate(length(max = 40))]
    pub default_town_or_city: Option<String>,
    #[validate(length(max = 80))]
    pub default_street_address1: Option<String>,
    #[validate(length(max = 80))]
    pub default_street_address2: Option<String>,
}

fn blank_to_none(value: Option<String>) -> Option<String> { value.filter(|v| !v.trim().is_empty()) }

impl UserProfile {
    pub fn for_user(user_id: Uuid) -> Self { Self { user_id, ..Default::default() } }

    pub fn apply_form(&mut self, form: ProfileForm) {
        self.default_phone_number = blank_to_none(form.default_phone_number);
        self.default_country = blank_to_none(form.default_country);
        self.default_postcode = blank_to_none(form.default_postcode);
        self.default_town_or_city = blank_to_none(form.default_town_or_city);
        self.default_street_address1 = blank_to_none(form.default_street_address1);
        self.default_street_address2 = blank_to_none(form.default_street_address2);
    }

    /// Saves the delivery details of an order as the new defaults.
    pub fn remember_delivery(&mut self, order: &Order) {
        self.default_phone_number = Some(order.phone_number.clone());
        self.default_country = Some(order.country.clone());
        self.default_postcode = Some(order.postcode.clone());
        self.default_town_or_city = Some(order.town_or_city.clone());
        self.default_street_address1 = Some(order.street_address1.clone());
        self.default_street_address2 = order.street_address2.clone();
    }

    /// Initial checkout form values for a signed-in user.
    pub fn prefill(&self, user: &User) -> OrderForm {
        OrderForm {
            full_name: String::new(),
            email: user.email.clone(),
            phone_number: self.default_phone_number.clone().unwrap_or_default(),
            country: self.default_country.clone().unwrap_or_default(),
            postcode: self.default_postcode.clone().unwrap_or_default(),
            town_or_city: self.default_town_or_city.clone().unwrap_or_default(),
            street_address1: self.default_street_address1.clone().unwrap_or_default(),
            street_address2: self.default_street_address2.clone(),
            save_info: false,
            client_secret: None,
        }
    }
}
