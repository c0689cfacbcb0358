use std::sync::Arc;

use bytes::Bytes;

use taskdeck_core::access;
use taskdeck_core::actor::Actor;
use taskdeck_core::document::{is_pdf, Document, MAX_DOCUMENTS_PER_TASK};
use taskdeck_db::Db;
use taskdeck_store::{task_document_key, ObjectStore};

use crate::ServiceError;

/// A file received by the upload endpoint, decoded from multipart.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub data: Bytes,
}

/// Document attachment and retrieval. Blob bytes live in the object
/// store; rows carry the metadata and the store key.
#[derive(Clone)]
pub struct DocumentService {
    db: Db,
    store: Arc<dyn ObjectStore>,
}

impl DocumentService {
    pub fn new(db: Db, store: Arc<dyn ObjectStore>) -> Self {
        Self { db, store }
    }

    /// Look up the parent task with read-gating: an existing task the
    /// actor may not see answers `NotFound`.
    fn parent_task_for_read(
        &self,
        task_id: &str,
        actor: &Actor,
    ) -> Result<taskdeck_core::Task, ServiceError> {
        let task = self
            .db
            .get_task_opt(task_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("task {task_id}")))?;
        if !access::can_view_document(actor, &task) {
            return Err(ServiceError::NotFound(format!("task {task_id}")));
        }
        Ok(task)
    }

    /// Attach a batch of PDF files to a task.
    ///
    /// The whole batch is validated before a single byte is written:
    /// every file must be a PDF, and the batch must fit under the
    /// per-task cap. A store failure mid-batch rolls back the blobs
    /// already written, so a task never ends up with half an upload.
    pub async fn attach(
        &self,
        task_id: &str,
        files: Vec<UploadedFile>,
        actor: &Actor,
    ) -> Result<Vec<Document>, ServiceError> {
        let task = self.db.get_task(task_id)?;
        if !access::can_mutate_task(actor, &task) {
            return Err(ServiceError::Unauthorized("task not assigned to you".into()));
        }
        if files.is_empty() {
            return Err(ServiceError::InvalidInput("no files supplied".into()));
        }
        for file in &files {
            if !is_pdf(&file.file_name) {
                return Err(ServiceError::InvalidInput(format!(
                    "{}: only PDF files may be attached",
                    file.file_name
                )));
            }
        }
        let existing = self.db.count_documents(task_id)?;
        if existing + files.len() > MAX_DOCUMENTS_PER_TASK {
            return Err(ServiceError::InvalidInput(format!(
                "a task may carry at most {MAX_DOCUMENTS_PER_TASK} documents ({existing} already attached)"
            )));
        }

        let mut written: Vec<String> = Vec::with_capacity(files.len());
        let mut documents = Vec::with_capacity(files.len());
        for file in &files {
            let id = uuid::Uuid::new_v4().to_string();
            let key = task_document_key(task_id, &id, &file.file_name);
            if let Err(e) = self.store.put(&key, file.data.clone()).await {
                self.rollback(&written).await;
                return Err(e.into());
            }
            written.push(key.clone());
            let document = match self.db.insert_document(
                &id,
                task_id,
                &file.file_name,
                &key,
                file.data.len() as i64,
            ) {
                Ok(doc) => doc,
                Err(e) => {
                    self.rollback(&written).await;
                    return Err(e.into());
                }
            };
            documents.push(document);
        }
        tracing::info!(task_id, count = documents.len(), "attached documents");
        Ok(documents)
    }

    async fn rollback(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.store.delete(key).await {
                tracing::warn!(key, error = %e, "failed to roll back document blob");
            }
        }
    }

    pub fn get(&self, id: &str) -> Result<Document, ServiceError> {
        Ok(self.db.get_document(id)?)
    }

    /// Documents visible on a task the actor may read.
    pub fn list(&self, task_id: &str, actor: &Actor) -> Result<Vec<Document>, ServiceError> {
        self.parent_task_for_read(task_id, actor)?;
        Ok(self.db.list_documents(task_id)?)
    }

    /// Fetch a document's metadata and content for viewing or download.
    /// Gated like reading the parent task; a missing row, hidden parent
    /// or missing blob all answer `NotFound`.
    pub async fn open(
        &self,
        id: &str,
        actor: &Actor,
    ) -> Result<(Document, Bytes), ServiceError> {
        let document = self.db.get_document(id)?;
        self.parent_task_for_read(&document.task_id, actor)?;
        let data = match self.store.get(&document.store_key).await {
            Ok(data) => data,
            Err(taskdeck_store::StoreError::NotFound(_)) => {
                return Err(ServiceError::NotFound(format!("document {id} content")));
            }
            Err(e) => return Err(e.into()),
        };
        Ok((document, data))
    }
}
