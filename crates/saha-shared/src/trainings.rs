//! Training records in the store: creation, lookups and partial updates.

use chrono::Utc;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::api::{CreateTrainingRequest, UpdateTrainingRequest};
use crate::error::{CoreError, CoreResult};
use crate::models::{Slide, Training, Viewer};
use crate::store::{self, Collection, OrderBy, Store};

pub async fn create(
    store: &dyn Store,
    viewer: &Viewer,
    req: CreateTrainingRequest,
) -> CoreResult<Training> {
    if req.title.trim().is_empty() {
        return Err(CoreError::validation("title is required"));
    }

    let mut training = Training::draft(
        &req.title,
        &req.category,
        &req.description,
        viewer.uid,
        Utc::now(),
    );
    training.id = store::insert(store, Collection::Trainings, &training).await?;
    tracing::info!(training_id = %training.id, page_url = %training.page_url, "training created");
    Ok(training)
}

pub async fn load(store: &dyn Store, id: Uuid) -> CoreResult<Training> {
    store::fetch(store, Collection::Trainings, id)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("training {id}")))
}

pub async fn find_by_page_url(store: &dyn Store, page_url: &str) -> CoreResult<Training> {
    store::find_by::<Training>(store, Collection::Trainings, "page_url", json!(page_url))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::not_found(format!("training page {page_url}")))
}

/// Newest first.
pub async fn list(store: &dyn Store) -> CoreResult<Vec<Training>> {
    let mut trainings: Vec<Training> =
        store::fetch_all(store, Collection::Trainings, Some(OrderBy::desc("created_at"))).await?;
    trainings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(trainings)
}

/// Apply the given fields and return the stored result.
pub async fn update(
    store: &dyn Store,
    id: Uuid,
    req: UpdateTrainingRequest,
) -> CoreResult<Training> {
    let mut fields = Map::new();
    if let Some(title) = req.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(CoreError::validation("title cannot be empty"));
        }
        fields.insert("title".to_string(), json!(title));
    }
    if let Some(category) = req.category {
        fields.insert("category".to_string(), json!(category.trim()));
    }
    if let Some(description) = req.description {
        fields.insert("description".to_string(), json!(description.trim()));
    }
    if let Some(slides) = req.slides {
        fields.insert("slides".to_string(), slides_value(&slides)?);
    }

    if !fields.is_empty() {
        store
            .update(Collection::Trainings, id, Value::Object(fields))
            .await?;
    }
    load(store, id).await
}

/// Overwrite the whole slide sequence in a single write.
pub async fn save_slides(store: &dyn Store, id: Uuid, slides: &[Slide]) -> CoreResult<()> {
    let value = slides_value(slides)?;
    store
        .update(Collection::Trainings, id, json!({ "slides": value }))
        .await?;
    Ok(())
}

pub async fn delete(store: &dyn Store, id: Uuid) -> CoreResult<()> {
    store.delete(Collection::Trainings, id).await?;
    tracing::info!(training_id = %id, "training deleted");
    Ok(())
}

fn slides_value(slides: &[Slide]) -> CoreResult<Value> {
    if slides.is_empty() {
        return Err(CoreError::validation("a training needs at least one slide"));
    }
    if slides.iter().any(|s| s.title.trim().is_empty()) {
        return Err(CoreError::validation("slide title is required"));
    }
    Ok(serde_json::to_value(slides).map_err(store::PersistenceError::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;

    fn author() -> Viewer {
        Viewer {
            uid: Uuid::new_v4(),
            display_name: "Ayşe".into(),
            role: Role::Sorumlu,
            unit: Some("Ankara".into()),
        }
    }

    fn request(title: &str) -> CreateTrainingRequest {
        CreateTrainingRequest {
            title: title.into(),
            category: "Saha".into(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn create_then_find_by_page_url() {
        let store = MemoryStore::new();
        let created = create(&store, &author(), request("Saha Ziyareti")).await.unwrap();
        assert!(!created.id.is_nil());

        let found = find_by_page_url(&store, &created.page_url).await.unwrap();
        assert_eq!(found, created);
        assert_matches!(
            find_by_page_url(&store, "yok-1").await,
            Err(CoreError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn blank_title_is_rejected_before_storing() {
        let store = MemoryStore::new();
        assert_matches!(
            create(&store, &author(), request("  ")).await,
            Err(CoreError::Validation(_))
        );
        assert!(list(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_keeps_absent_fields_and_rejects_empty_slides() {
        let store = MemoryStore::new();
        let created = create(&store, &author(), request("Rapor")).await.unwrap();

        let updated = update(
            &store,
            created.id,
            UpdateTrainingRequest {
                description: Some("Aylık rapor".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.title, "Rapor");
        assert_eq!(updated.description, "Aylık rapor");
        assert_eq!(updated.slides, created.slides);

        let err = update(
            &store,
            created.id,
            UpdateTrainingRequest {
                slides: Some(vec![]),
                ..Default::default()
            },
        )
        .await;
        assert_matches!(err, Err(CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn writes_to_a_deleted_training_are_not_found() {
        let store = MemoryStore::new();
        let created = create(&store, &author(), request("Rapor")).await.unwrap();
        delete(&store, created.id).await.unwrap();

        let retitled = update(
            &store,
            created.id,
            UpdateTrainingRequest {
                title: Some("Yeni".into()),
                ..Default::default()
            },
        )
        .await;
        assert_matches!(retitled, Err(CoreError::NotFound(_)));
        assert_matches!(
            update(&store, created.id, UpdateTrainingRequest::default()).await,
            Err(CoreError::NotFound(_))
        );
        assert_matches!(
            save_slides(&store, created.id, &created.slides).await,
            Err(CoreError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryStore::new();
        let first = create(&store, &author(), request("Bir")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = create(&store, &author(), request("İki")).await.unwrap();

        let ids: Vec<_> = list(&store).await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
