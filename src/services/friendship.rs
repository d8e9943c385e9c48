use std::sync::Arc;

use serde::Deserialize;

use crate::db::models::{Friendship, FriendshipStatus, NewFriendship};
use crate::error::{AppError, AppResult, Validator};
use crate::store::{FriendshipStore, StoreError, UserStore};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestInput {
    pub addressee_id: String,
}

#[derive(Debug, Deserialize)]
pub struct FriendshipStatusInput {
    pub status: FriendshipStatus,
}

pub struct FriendshipService {
    friendships: Arc<dyn FriendshipStore>,
    users: Arc<dyn UserStore>,
}

impl FriendshipService {
    pub fn new(friendships: Arc<dyn FriendshipStore>, users: Arc<dyn UserStore>) -> Self {
        Self { friendships, users }
    }

    pub async fn list(
        &self,
        target_user_id: &str,
        requesting_user_id: &str,
        status: Option<FriendshipStatus>,
    ) -> AppResult<Vec<Friendship>> {
        if target_user_id != requesting_user_id {
            return Err(AppError::Forbidden(
                "You can only view your own friendships".to_string(),
            ));
        }
        Ok(self.friendships.list_friendships(target_user_id, status).await?)
    }

    /// Any existing row between the pair blocks a new request, whatever its
    /// status or direction.
    #[tracing::instrument(skip(self, input), fields(addressee = %input.addressee_id))]
    pub async fn create_request(
        &self,
        requester_id: &str,
        input: FriendRequestInput,
    ) -> AppResult<Friendship> {
        Validator::new()
            .require("addresseeId", &input.addressee_id)
            .finish()?;

        if input.addressee_id == requester_id {
            return Err(AppError::Conflict(
                "You cannot send a friend request to yourself".to_string(),
            ));
        }

        if self.users.get_user(&input.addressee_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        if self
            .friendships
            .find_between(requester_id, &input.addressee_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Friendship already exists".to_string()));
        }

        let friendship = self
            .friendships
            .create_friendship(NewFriendship {
                requester_id: requester_id.to_string(),
                addressee_id: input.addressee_id,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => {
                    AppError::Conflict("Friendship already exists".to_string())
                }
                other => other.into(),
            })?;

        tracing::info!(friendship_id = %friendship.id, "friend request sent");
        Ok(friendship)
    }

    /// Only the addressee may answer a request.
    pub async fn update_status(
        &self,
        id: &str,
        user_id: &str,
        input: FriendshipStatusInput,
    ) -> AppResult<Friendship> {
        if input.status == FriendshipStatus::Pending {
            return Err(AppError::invalid_field(
                "status",
                "status must be one of accepted, declined, blocked",
            ));
        }

        let friendship = self
            .friendships
            .get_friendship(id)
            .await?
            .filter(|f| f.involves(user_id))
            .ok_or_else(|| AppError::NotFound("Friendship not found".to_string()))?;

        if friendship.addressee_id != user_id {
            return Err(AppError::Forbidden(
                "Only the recipient can respond to a friend request".to_string(),
            ));
        }

        self.friendships
            .update_status(id, input.status)
            .await?
            .ok_or_else(|| AppError::NotFound("Friendship not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::NewUser;
    use crate::store::Stores;

    async fn setup() -> (FriendshipService, String, String) {
        let stores = Stores::in_memory();
        let mut ids = Vec::new();
        for name in ["alice", "bob"] {
            let user = stores
                .users
                .create_user(NewUser {
                    username: name.into(),
                    password_hash: "h".into(),
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        let service = FriendshipService::new(stores.friendships.clone(), stores.users.clone());
        let b = ids.pop().unwrap();
        let a = ids.pop().unwrap();
        (service, a, b)
    }

    fn to(id: &str) -> FriendRequestInput {
        FriendRequestInput {
            addressee_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_reverse_request_conflicts() {
        let (service, a, b) = setup().await;
        let f = service.create_request(&a, to(&b)).await.unwrap();
        assert_eq!(f.status, FriendshipStatus::Pending);

        let err = service.create_request(&b, to(&a)).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn test_self_request_conflicts() {
        let (service, a, _) = setup().await;
        assert_eq!(
            service.create_request(&a, to(&a)).await.unwrap_err().code(),
            "CONFLICT"
        );
    }

    #[tokio::test]
    async fn test_requester_cannot_accept() {
        let (service, a, b) = setup().await;
        let f = service.create_request(&a, to(&b)).await.unwrap();

        let accept = || FriendshipStatusInput {
            status: FriendshipStatus::Accepted,
        };
        let err = service.update_status(&f.id, &a, accept()).await.unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");

        let accepted = service.update_status(&f.id, &b, accept()).await.unwrap();
        assert_eq!(accepted.status, FriendshipStatus::Accepted);
    }

    #[tokio::test]
    async fn test_declined_request_still_blocks() {
        let (service, a, b) = setup().await;
        let f = service.create_request(&a, to(&b)).await.unwrap();
        service
            .update_status(
                &f.id,
                &b,
                FriendshipStatusInput {
                    status: FriendshipStatus::Declined,
                },
            )
            .await
            .unwrap();
        assert_eq!(
            service.create_request(&a, to(&b)).await.unwrap_err().code(),
            "CONFLICT"
        );
    }

    #[tokio::test]
    async fn test_list_other_users_friendships_is_forbidden() {
        let (service, a, b) = setup().await;
        assert_eq!(
            service.list(&a, &b, None).await.unwrap_err().code(),
            "FORBIDDEN"
        );
        assert!(service.list(&a, &a, None).await.unwrap().is_empty());
    }
}
