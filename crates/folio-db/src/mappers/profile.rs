//! Profile row -> domain

use folio_core::{Profile, Snowflake};

use crate::models::ProfileModel;

impl From<ProfileModel> for Profile {
    fn from(model: ProfileModel) -> Self {
        Profile::new(Snowflake::new(model.id), model.name, model.avatar)
    }
}
