pub use mediator::DefaultAsyncMediator;

pub mod middleware;

use crate::features::AuditState;

pub type AppMediator = DefaultAsyncMediator;

pub fn build_mediator(state: AuditState) -> AppMediator {
    DefaultAsyncMediator::builder()
        // Audit trail
        .add_handler({
            let recorder = state.recorder.clone();
            move |cmd| {
                let recorder = recorder.clone();
                async move {
                    crate::features::audit_trail::commands::record_change::handle(recorder, cmd)
                        .await
                }
            }
        })
        .add_handler({
            let store = state.store.clone();
            move |cmd| {
                let store = store.clone();
                async move { crate::features::audit_trail::commands::purge::handle(store, cmd).await }
            }
        })
        .add_handler({
            let store = state.store.clone();
            move |query| {
                let store = store.clone();
                async move {
                    crate::features::audit_trail::queries::list_operations::handle(store, query)
                        .await
                }
            }
        })
        .add_handler({
            let store = state.store.clone();
            let links = state.links.clone();
            move |query| {
                let store = store.clone();
                let links = links.clone();
                async move {
                    crate::features::audit_trail::queries::get_record::handle(store, links, query)
                        .await
                }
            }
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::memory::MemoryAuditStore;
    use crate::audit::recorder::AuditRecorder;
    use crate::features::audit_trail::RouteLinkResolver;
    use std::sync::Arc;

    // The builder blocks in place while registering handlers, which needs a
    // multi-threaded runtime.
    #[tokio::test(flavor = "multi_thread")]
    async fn test_mediator_builds() {
        let store = Arc::new(MemoryAuditStore::new());
        let (recorder, _worker) = AuditRecorder::spawn(store.clone(), 16);

        let state = AuditState {
            store,
            recorder,
            links: Arc::new(RouteLinkResolver),
        };

        let _mediator = build_mediator(state);
    }
}
