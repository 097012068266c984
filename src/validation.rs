use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ApiError;
use crate::models::{
    ChangePasswordRequest, EventRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
};

/// Minimum length accepted for a new password.
pub const MIN_PASSWORD_LEN: usize = 6;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn required(value: &str, message: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(message));
    }
    Ok(())
}

fn email(value: &str) -> Result<(), ApiError> {
    required(value, "Email is required")?;
    if !is_valid_email(value.trim()) {
        return Err(ApiError::validation("Invalid email address"));
    }
    Ok(())
}

pub fn validate_login(req: &LoginRequest) -> Result<(), ApiError> {
    required(&req.email, "Email is required")?;
    required(&req.password, "Password is required")
}

pub fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    required(&req.full_name, "Full name is required")?;
    email(&req.email)?;
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub fn validate_profile(req: &UpdateProfileRequest) -> Result<(), ApiError> {
    required(&req.full_name, "Full name is required")?;
    email(&req.email)
}

pub fn validate_email_change(value: &str) -> Result<(), ApiError> {
    email(value)
}

pub fn validate_password_change(req: &ChangePasswordRequest) -> Result<(), ApiError> {
    required(&req.current_password, "Current password is required")?;
    required(&req.new_password, "New password is required")?;
    if req.new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if req.confirm_password != req.new_password {
        return Err(ApiError::validation("Passwords do not match"));
    }
    Ok(())
}

/// validate_event
///
/// Same rules for create and edit: every descriptive field filled in, a
/// strictly positive duration and room for at least one participant.
pub fn validate_event(req: &EventRequest) -> Result<(), ApiError> {
    required(&req.name, "Event name is required")?;
    required(&req.description, "Description is required")?;
    required(&req.organizer, "Organizer is required")?;
    required(&req.venue, "Venue is required")?;
    if req.end_time <= req.start_time {
        return Err(ApiError::validation("End time must be after start time"));
    }
    if req.capacity < 1 {
        return Err(ApiError::validation("Capacity must be at least 1"));
    }
    Ok(())
}

pub fn validate_feedback(feedback: &str) -> Result<(), ApiError> {
    required(feedback, "Please enter feedback")
}
