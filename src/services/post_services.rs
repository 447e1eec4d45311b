//! Post form cleaning: field checks, group lookup and image decoding.
use crate::dtos::post_dtos::{FormErrors, GroupChoice, INVALID_CHOICE, PostFormDTO, add_error};
use crate::error::Result;
use crate::repositories::Store;
use crate::services::media_services::DecodedImage;

pub enum FormOutcome<T> {
    Valid(T),
    Invalid(FormErrors),
}

#[derive(Debug)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<i64>,
    /// `None` when no image was sent. On edit that keeps the current one.
    pub image: Option<DecodedImage>,
}

pub async fn clean_post_form(
    store: &dyn Store,
    form: &PostFormDTO,
) -> Result<FormOutcome<CleanedPost>> {
    let mut errors = form.validate();

    let group_id = match form.group_choice() {
        GroupChoice::Id(id) => {
            if store.get_group(id).await?.is_none() {
                add_error(&mut errors, "group", INVALID_CHOICE);
            }
            Some(id)
        }
        GroupChoice::None | GroupChoice::Invalid => None,
    };

    let image = match form.image() {
        Some(upload) if !errors.contains_key("image") => match upload.decode() {
            Ok(image) => Some(image),
            Err(e) => {
                add_error(&mut errors, "image", e.to_string());
                None
            }
        },
        _ => None,
    };

    if !errors.is_empty() {
        return Ok(FormOutcome::Invalid(errors));
    }
    Ok(FormOutcome::Valid(CleanedPost {
        text: form.text().to_string(),
        group_id,
        image,
    }))
}
