//! Teacher and candidate endpoints.
//!
//! Subjects, invitations and notifications change on the other side (a
//! candidate accepts, a teacher revokes) far more often than exams do, so
//! none of these calls are cached: every method is a single request.

use crate::api::{self, Method, RemoteApi};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// A subject a teacher groups exams and candidates under.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /teacher/subjects` and `PUT /teacher/subjects/:id`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
    Revoked,
}

/// An invitation from a teacher to a candidate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub status: InvitationStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /teacher/invitations`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvitation {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A candidate's answer to an invitation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvitationResponse {
    Accept,
    Decline,
}

impl InvitationResponse {
    /// Status the invitation ends up in.
    pub fn status(&self) -> InvitationStatus {
        match self {
            InvitationResponse::Accept => InvitationStatus::Accepted,
            InvitationResponse::Decline => InvitationStatus::Declined,
        }
    }
}

impl fmt::Display for InvitationResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvitationResponse::Accept => write!(f, "accept"),
            InvitationResponse::Decline => write!(f, "decline"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Endpoints under `/teacher`.
#[derive(Clone, Debug)]
pub struct TeacherService<A: RemoteApi> {
    api: A,
}

impl<A: RemoteApi> TeacherService<A> {
    pub fn new(api: A) -> Self {
        TeacherService { api }
    }

    pub async fn list_subjects(&self) -> Result<Vec<Subject>> {
        self.api.get_json("teacher/subjects", &[]).await
    }

    pub async fn create_subject(&self, subject: &SubjectInput) -> Result<Subject> {
        let created: Subject = self
            .api
            .send_json(Method::POST, "teacher/subjects", subject)
            .await?;
        info!("Created subject {}", created.id);
        Ok(created)
    }

    /// Replace a subject (`PUT`).
    pub async fn update_subject(&self, subject_id: &str, subject: &SubjectInput) -> Result<Subject> {
        let path = api::path(&["teacher", "subjects", subject_id])?;
        let updated = self.api.send_json(Method::PUT, &path, subject).await?;
        info!("Updated subject {}", subject_id);
        Ok(updated)
    }

    pub async fn delete_subject(&self, subject_id: &str) -> Result<()> {
        let path = api::path(&["teacher", "subjects", subject_id])?;
        self.api.delete(&path).await?;
        info!("Deleted subject {}", subject_id);
        Ok(())
    }

    pub async fn send_invitation(&self, invitation: &NewInvitation) -> Result<Invitation> {
        let sent: Invitation = self
            .api
            .send_json(Method::POST, "teacher/invitations", invitation)
            .await?;
        info!("Sent invitation {} to {}", sent.id, invitation.email);
        Ok(sent)
    }

    pub async fn list_invitations(&self) -> Result<Vec<Invitation>> {
        self.api.get_json("teacher/invitations", &[]).await
    }

    pub async fn revoke_invitation(&self, invitation_id: &str) -> Result<()> {
        let path = api::path(&["teacher", "invitations", invitation_id])?;
        self.api.delete(&path).await?;
        info!("Revoked invitation {}", invitation_id);
        Ok(())
    }
}

/// Endpoints under `/candidate`.
#[derive(Clone, Debug)]
pub struct CandidateService<A: RemoteApi> {
    api: A,
}

impl<A: RemoteApi> CandidateService<A> {
    pub fn new(api: A) -> Self {
        CandidateService { api }
    }

    pub async fn list_invitations(&self) -> Result<Vec<Invitation>> {
        self.api.get_json("candidate/invitations", &[]).await
    }

    /// Accept or decline with `PUT /candidate/invitations/:id`.
    ///
    /// The body is `{"status": "accepted" | "declined"}`.
    pub async fn respond_to_invitation(
        &self,
        invitation_id: &str,
        response: InvitationResponse,
    ) -> Result<Invitation> {
        let path = api::path(&["candidate", "invitations", invitation_id])?;
        let body = json!({ "status": response.status() });
        let invitation = self.api.send_json(Method::PUT, &path, &body).await?;
        info!("Invitation {}: {}", invitation_id, response);
        Ok(invitation)
    }

    pub async fn list_notifications(&self) -> Result<Vec<Notification>> {
        self.api.get_json("candidate/notifications", &[]).await
    }

    pub async fn mark_notification_read(&self, notification_id: &str) -> Result<()> {
        let path = api::path(&["candidate", "notifications", notification_id, "read"])?;
        self.api.send(Method::PUT, &path, None).await?;
        debug!("Marked notification {} read", notification_id);
        Ok(())
    }
}
