//! Forum projection across whole blocks.

mod common;

use common::*;
use querynode_core::metadata::ForumPostMetadata;
use querynode_core::{
    CategoryId, CategoryStatus, EventId, PostId, PostStatus, ThreadId, ThreadStatus, WorkerId,
};
use querynode_indexer::storage::Store;
use querynode_indexer::{EventData, SubstrateEvent};
use serde_json::json;

#[tokio::test]
async fn test_category_created_then_deleted() {
    let (projector, _temp_db) = setup().await;
    seed_forum_workers(&projector).await;

    projector
        .apply_block(&block(
            1,
            vec![event(
                "forum.CategoryCreated",
                0,
                category_created(1, None, "General"),
            )],
        ))
        .await
        .unwrap();

    {
        let mut conn = projector.storage().acquire().await.unwrap();
        let mut store = Store::new(&mut conn);
        let category = store.category(&CategoryId::from(1)).await.unwrap().unwrap();
        assert_eq!(category.title, "General");
        assert_eq!(category.parent, None);
        assert_eq!(category.status, CategoryStatus::Active);
    }

    projector
        .apply_block(&block(
            2,
            vec![event("forum.CategoryDeleted", 3, vec![json!(1), json!("Lead")])],
        ))
        .await
        .unwrap();

    let mut conn = projector.storage().acquire().await.unwrap();
    let mut store = Store::new(&mut conn);
    let category = store.category(&CategoryId::from(1)).await.unwrap().unwrap();
    assert_eq!(
        category.status,
        CategoryStatus::Removed {
            category_deleted_event: EventId::new(2, 3)
        }
    );
    assert_eq!(category.updated_at, 12_000);

    let record = store.event(&EventId::new(2, 3)).await.unwrap().unwrap();
    assert_eq!(
        record.data,
        EventData::CategoryDeleted {
            category: CategoryId::from(1),
            actor: WorkerId::for_group(FORUM_GROUP, 0),
        }
    );
}

#[tokio::test]
async fn test_archive_then_unarchive_returns_to_active() {
    let (projector, _temp_db) = setup().await;
    seed_forum_workers(&projector).await;

    projector
        .apply_block(&block(
            1,
            vec![
                event("forum.CategoryCreated", 0, category_created(1, None, "General")),
                event(
                    "forum.CategoryUpdated",
                    1,
                    vec![json!(1), json!(true), json!({ "Moderator": 7 })],
                ),
            ],
        ))
        .await
        .unwrap();

    {
        let mut conn = projector.storage().acquire().await.unwrap();
        let mut store = Store::new(&mut conn);
        let category = store.category(&CategoryId::from(1)).await.unwrap().unwrap();
        assert_eq!(
            category.status,
            CategoryStatus::Archived {
                category_updated_event: EventId::new(1, 1)
            }
        );
    }

    projector
        .apply_block(&block(
            2,
            vec![event(
                "forum.CategoryUpdated",
                0,
                vec![json!(1), json!(false), json!("Lead")],
            )],
        ))
        .await
        .unwrap();

    let mut conn = projector.storage().acquire().await.unwrap();
    let mut store = Store::new(&mut conn);
    let category = store.category(&CategoryId::from(1)).await.unwrap().unwrap();
    assert_eq!(category.status, CategoryStatus::Active);
}

#[tokio::test]
async fn test_thread_with_poll_and_vote() {
    let (projector, _temp_db) = setup().await;
    seed_forum_workers(&projector).await;

    let poll = json!({
        "description": bytes(b"Favourite?".to_vec()),
        "end_time": 1_700_000_000_000u64,
        "alternatives": [bytes(b"A".to_vec()), bytes(b"B".to_vec())],
    });

    projector
        .apply_block(&block(
            1,
            vec![
                event("forum.CategoryCreated", 0, category_created(1, None, "General")),
                event(
                    "forum.ThreadCreated",
                    1,
                    vec![
                        json!(1),
                        json!(10),
                        json!(100),
                        json!(5),
                        text("Hello"),
                        text("First post"),
                        poll,
                    ],
                ),
                event("forum.VoteOnPoll", 2, vec![json!(10), json!(1), json!(6)]),
            ],
        ))
        .await
        .unwrap();

    let mut conn = projector.storage().acquire().await.unwrap();
    let mut store = Store::new(&mut conn);

    let thread = store.thread(&ThreadId::from(10)).await.unwrap().unwrap();
    assert_eq!(thread.title, "Hello");
    assert_eq!(thread.status, ThreadStatus::Active);
    assert!(!thread.is_sticky);

    let post = store.post(&PostId::from(100)).await.unwrap().unwrap();
    assert_eq!(post.text, "First post");
    assert_eq!(post.thread, ThreadId::from(10));
    assert_eq!(post.status, PostStatus::Active);

    let vote = store.event(&EventId::new(1, 2)).await.unwrap().unwrap();
    match vote.data {
        EventData::VoteOnPoll { voting_member, .. } => {
            assert_eq!(voting_member.as_str(), "6");
        }
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[tokio::test]
async fn test_thread_deleted_respects_hide() {
    let (projector, _temp_db) = setup().await;
    seed_forum_workers(&projector).await;

    let thread = |id: u64, post: u64, index: u32| {
        event(
            "forum.ThreadCreated",
            index,
            vec![
                json!(1),
                json!(id),
                json!(post),
                json!(5),
                text("t"),
                text("p"),
                json!(null),
            ],
        )
    };

    projector
        .apply_block(&block(
            1,
            vec![
                event("forum.CategoryCreated", 0, category_created(1, None, "General")),
                thread(10, 100, 1),
                thread(11, 101, 2),
            ],
        ))
        .await
        .unwrap();

    projector
        .apply_block(&block(
            2,
            vec![
                event(
                    "forum.ThreadDeleted",
                    0,
                    vec![json!(10), json!(5), json!(1), json!(true)],
                ),
                event(
                    "forum.ThreadDeleted",
                    1,
                    vec![json!(11), json!(5), json!(1), json!(false)],
                ),
            ],
        ))
        .await
        .unwrap();

    let mut conn = projector.storage().acquire().await.unwrap();
    let mut store = Store::new(&mut conn);
    assert_eq!(
        store.thread(&ThreadId::from(10)).await.unwrap().unwrap().status,
        ThreadStatus::Removed {
            thread_deleted_event: EventId::new(2, 0)
        }
    );
    assert_eq!(
        store.thread(&ThreadId::from(11)).await.unwrap().unwrap().status,
        ThreadStatus::Locked {
            thread_deleted_event: EventId::new(2, 1)
        }
    );
}

#[tokio::test]
async fn test_sticky_threads_recomputed_twice() {
    let (projector, _temp_db) = setup().await;
    seed_forum_workers(&projector).await;

    let mut events = vec![event(
        "forum.CategoryCreated",
        0,
        category_created(1, None, "General"),
    )];
    for (i, id) in [10u64, 11, 12].into_iter().enumerate() {
        events.push(event(
            "forum.ThreadCreated",
            i as u32 + 1,
            vec![
                json!(1),
                json!(id),
                json!(id * 10),
                json!(5),
                text("t"),
                text("p"),
                json!(null),
            ],
        ));
    }
    projector.apply_block(&block(1, events)).await.unwrap();

    let sticky = || vec![json!(1), json!([10, 12]), json!("Lead")];
    projector
        .apply_block(&block(
            2,
            vec![event("forum.CategoryStickyThreadUpdate", 0, sticky())],
        ))
        .await
        .unwrap();
    projector
        .apply_block(&block(
            3,
            vec![event("forum.CategoryStickyThreadUpdate", 0, sticky())],
        ))
        .await
        .unwrap();

    let mut conn = projector.storage().acquire().await.unwrap();
    let mut store = Store::new(&mut conn);
    assert!(store.thread(&ThreadId::from(10)).await.unwrap().unwrap().is_sticky);
    assert!(!store.thread(&ThreadId::from(11)).await.unwrap().unwrap().is_sticky);
    assert!(store.thread(&ThreadId::from(12)).await.unwrap().unwrap().is_sticky);
    assert_eq!(
        store
            .count_events("forum.CategoryStickyThreadUpdate")
            .await
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn test_missing_thread_rolls_back_whole_block() {
    let (projector, _temp_db) = setup().await;
    seed_forum_workers(&projector).await;

    let err = projector
        .apply_block(&block(
            4,
            vec![
                event("forum.CategoryCreated", 0, category_created(1, None, "General")),
                event(
                    "forum.ThreadModerated",
                    1,
                    vec![json!(99), text("spam"), json!("Lead")],
                ),
            ],
        ))
        .await
        .unwrap_err();
    assert!(err.is_inconsistency());

    let mut conn = projector.storage().acquire().await.unwrap();
    let mut store = Store::new(&mut conn);
    assert!(store.category(&CategoryId::from(1)).await.unwrap().is_none());
    assert!(store.event(&EventId::new(4, 0)).await.unwrap().is_none());
    drop(store);
    drop(conn);

    let state = projector.storage().get_sync_state().await.unwrap();
    assert_eq!(state.last_block_number, None);
}

#[tokio::test]
async fn test_moderator_membership() {
    let (projector, _temp_db) = setup().await;
    seed_forum_workers(&projector).await;

    projector
        .apply_block(&block(
            1,
            vec![
                event("forum.CategoryCreated", 0, category_created(1, None, "General")),
                event(
                    "forum.CategoryMembershipOfModeratorUpdated",
                    1,
                    vec![json!(7), json!(1), json!(true)],
                ),
            ],
        ))
        .await
        .unwrap();

    {
        let mut conn = projector.storage().acquire().await.unwrap();
        let mut store = Store::new(&mut conn);
        assert_eq!(
            store.category_moderators(&CategoryId::from(1)).await.unwrap(),
            vec![WorkerId::for_group(FORUM_GROUP, 7)]
        );
    }

    // Removing twice: the second removal is a logged no-op, the event is kept.
    projector
        .apply_block(&block(
            2,
            vec![
                event(
                    "forum.CategoryMembershipOfModeratorUpdated",
                    0,
                    vec![json!(7), json!(1), json!(false)],
                ),
                event(
                    "forum.CategoryMembershipOfModeratorUpdated",
                    1,
                    vec![json!(7), json!(1), json!(false)],
                ),
            ],
        ))
        .await
        .unwrap();

    let mut conn = projector.storage().acquire().await.unwrap();
    let mut store = Store::new(&mut conn);
    assert!(store
        .category_moderators(&CategoryId::from(1))
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        store
            .count_events("forum.CategoryMembershipOfModeratorUpdated")
            .await
            .unwrap(),
        3
    );
}

#[tokio::test]
async fn test_post_added_metadata_and_raw_text() {
    use prost::Message;

    let (projector, _temp_db) = setup().await;
    seed_forum_workers(&projector).await;

    let reply = ForumPostMetadata {
        text: Some("Agreed".to_string()),
        replies_to: Some(100),
    }
    .encode_to_vec();
    let dangling = ForumPostMetadata {
        text: Some("To nobody".to_string()),
        replies_to: Some(555),
    }
    .encode_to_vec();

    projector
        .apply_block(&block(
            1,
            vec![
                event("forum.CategoryCreated", 0, category_created(1, None, "General")),
                event(
                    "forum.ThreadCreated",
                    1,
                    vec![
                        json!(1),
                        json!(10),
                        json!(100),
                        json!(5),
                        text("t"),
                        text("p"),
                        json!(null),
                    ],
                ),
                event(
                    "forum.PostAdded",
                    2,
                    vec![json!(101), json!(6), json!(1), json!(10), bytes(reply), json!(true)],
                ),
                event(
                    "forum.PostAdded",
                    3,
                    vec![json!(102), json!(6), json!(1), json!(10), text("plain words"), json!(false)],
                ),
                event(
                    "forum.PostAdded",
                    4,
                    vec![json!(103), json!(6), json!(1), json!(10), bytes(dangling), json!(true)],
                ),
            ],
        ))
        .await
        .unwrap();

    let mut conn = projector.storage().acquire().await.unwrap();
    let mut store = Store::new(&mut conn);

    let reply = store.post(&PostId::from(101)).await.unwrap().unwrap();
    assert_eq!(reply.text, "Agreed");
    assert_eq!(reply.replies_to, Some(PostId::from(100)));
    assert_eq!(reply.status, PostStatus::Active);

    let plain = store.post(&PostId::from(102)).await.unwrap().unwrap();
    assert_eq!(plain.text, "plain words");
    assert_eq!(plain.status, PostStatus::initial(false));

    let dangling = store.post(&PostId::from(103)).await.unwrap().unwrap();
    assert_eq!(dangling.text, "To nobody");
    assert_eq!(dangling.replies_to, None);
}

#[tokio::test]
async fn test_unknown_event_is_skipped() {
    let (projector, _temp_db) = setup().await;

    let summary = projector
        .apply_block(&block(
            9,
            vec![event("balances.Transfer", 0, vec![json!(1), json!(2), json!(3)])],
        ))
        .await
        .unwrap();
    assert_eq!(summary.handled, 0);
    assert_eq!(summary.skipped, 1);

    let state = projector.storage().get_sync_state().await.unwrap();
    assert_eq!(state.last_block_number, Some(9));

    let stats = projector.storage().stats().await.unwrap();
    assert_eq!(stats.event_count, 0);
}

fn thread_created(category: u64, thread: u64, post: u64, index: u32) -> SubstrateEvent {
    event(
        "forum.ThreadCreated",
        index,
        vec![
            json!(category),
            json!(thread),
            json!(post),
            json!(5),
            text("t"),
            text("p"),
            json!(null),
        ],
    )
}

#[tokio::test]
async fn test_thread_moved_requires_matching_old_category() {
    let (projector, _temp_db) = setup().await;
    seed_forum_workers(&projector).await;

    projector
        .apply_block(&block(
            1,
            vec![
                event("forum.CategoryCreated", 0, category_created(1, None, "General")),
                event("forum.CategoryCreated", 1, category_created(2, None, "Offtopic")),
                event("forum.CategoryCreated", 2, category_created(3, Some(1), "Archive")),
                thread_created(1, 10, 100, 3),
            ],
        ))
        .await
        .unwrap();

    let err = projector
        .apply_block(&block(
            2,
            vec![event(
                "forum.ThreadMoved",
                0,
                vec![json!(10), json!(3), json!("Lead"), json!(2)],
            )],
        ))
        .await
        .unwrap_err();
    assert!(err.is_inconsistency());

    projector
        .apply_block(&block(
            3,
            vec![event(
                "forum.ThreadMoved",
                0,
                vec![json!(10), json!(2), json!({ "Moderator": 7 }), json!(1)],
            )],
        ))
        .await
        .unwrap();

    let mut conn = projector.storage().acquire().await.unwrap();
    let mut store = Store::new(&mut conn);
    let thread = store.thread(&ThreadId::from(10)).await.unwrap().unwrap();
    assert_eq!(thread.category, CategoryId::from(2));
    assert_eq!(thread.updated_at, 18_000);

    let record = store.event(&EventId::new(3, 0)).await.unwrap().unwrap();
    assert_eq!(
        record.data,
        EventData::ThreadMoved {
            thread: ThreadId::from(10),
            old_category: CategoryId::from(1),
            new_category: CategoryId::from(2),
            actor: WorkerId::for_group(FORUM_GROUP, 7),
        }
    );
}

#[tokio::test]
async fn test_thread_title_and_post_text_updates() {
    let (projector, _temp_db) = setup().await;
    seed_forum_workers(&projector).await;

    projector
        .apply_block(&block(
            1,
            vec![
                event("forum.CategoryCreated", 0, category_created(1, None, "General")),
                thread_created(1, 10, 100, 1),
            ],
        ))
        .await
        .unwrap();

    projector
        .apply_block(&block(
            2,
            vec![
                event(
                    "forum.ThreadTitleUpdated",
                    0,
                    vec![json!(10), json!(5), json!(1), text("Renamed")],
                ),
                event(
                    "forum.PostTextUpdated",
                    1,
                    vec![json!(100), json!(5), json!(1), json!(10), text("Edited")],
                ),
            ],
        ))
        .await
        .unwrap();

    let mut conn = projector.storage().acquire().await.unwrap();
    let mut store = Store::new(&mut conn);

    let thread = store.thread(&ThreadId::from(10)).await.unwrap().unwrap();
    assert_eq!(thread.title, "Renamed");
    assert_eq!(thread.updated_at, 12_000);

    let post = store.post(&PostId::from(100)).await.unwrap().unwrap();
    assert_eq!(post.text, "Edited");
    assert_eq!(post.created_at, 6_000);
    assert_eq!(post.updated_at, 12_000);

    let record = store.event(&EventId::new(2, 1)).await.unwrap().unwrap();
    assert_eq!(
        record.data,
        EventData::PostTextUpdated {
            post: PostId::from(100),
            new_text: "Edited".to_string(),
        }
    );
}

#[tokio::test]
async fn test_post_moderation_and_all_or_nothing_deletion() {
    let (projector, _temp_db) = setup().await;
    seed_forum_workers(&projector).await;

    let reply = |post: u64, index: u32| {
        event(
            "forum.PostAdded",
            index,
            vec![json!(post), json!(6), json!(1), json!(10), text("reply"), json!(true)],
        )
    };

    projector
        .apply_block(&block(
            1,
            vec![
                event("forum.CategoryCreated", 0, category_created(1, None, "General")),
                thread_created(1, 10, 100, 1),
                reply(101, 2),
                reply(102, 3),
            ],
        ))
        .await
        .unwrap();

    projector
        .apply_block(&block(
            2,
            vec![event(
                "forum.PostModerated",
                0,
                vec![json!(101), text("spam"), json!({ "Moderator": 7 })],
            )],
        ))
        .await
        .unwrap();

    {
        let mut conn = projector.storage().acquire().await.unwrap();
        let mut store = Store::new(&mut conn);
        assert_eq!(
            store.post(&PostId::from(101)).await.unwrap().unwrap().status,
            PostStatus::Moderated {
                post_moderated_event: EventId::new(2, 0)
            }
        );
    }

    // A moderated post cannot be deleted, so nothing in the batch changes.
    let err = projector
        .apply_block(&block(
            3,
            vec![event(
                "forum.PostDeleted",
                0,
                vec![text("cleanup"), json!(6), json!([102, 101]), json!(true)],
            )],
        ))
        .await
        .unwrap_err();
    assert!(err.is_inconsistency());

    {
        let mut conn = projector.storage().acquire().await.unwrap();
        let mut store = Store::new(&mut conn);
        assert_eq!(
            store.post(&PostId::from(102)).await.unwrap().unwrap().status,
            PostStatus::Active
        );
        assert!(store.event(&EventId::new(3, 0)).await.unwrap().is_none());
    }

    projector
        .apply_block(&block(
            4,
            vec![event(
                "forum.PostDeleted",
                0,
                vec![text("cleanup"), json!(6), json!([100, 102]), json!(false)],
            )],
        ))
        .await
        .unwrap();

    let mut conn = projector.storage().acquire().await.unwrap();
    let mut store = Store::new(&mut conn);
    for id in [100u64, 102] {
        assert_eq!(
            store.post(&PostId::from(id)).await.unwrap().unwrap().status,
            PostStatus::Locked {
                post_deleted_event: Some(EventId::new(4, 0))
            }
        );
    }
}

#[tokio::test]
async fn test_poll_end_time_out_of_range_is_fatal() {
    let (projector, _temp_db) = setup().await;
    seed_forum_workers(&projector).await;

    let poll = json!({
        "description": bytes(b"When?".to_vec()),
        "end_time": u64::MAX,
        "alternatives": [bytes(b"Never".to_vec())],
    });

    let err = projector
        .apply_block(&block(
            1,
            vec![
                event("forum.CategoryCreated", 0, category_created(1, None, "General")),
                event(
                    "forum.ThreadCreated",
                    1,
                    vec![
                        json!(1),
                        json!(10),
                        json!(100),
                        json!(5),
                        text("t"),
                        text("p"),
                        poll,
                    ],
                ),
            ],
        ))
        .await
        .unwrap_err();
    assert!(err.is_inconsistency());

    let stats = projector.storage().stats().await.unwrap();
    assert_eq!(stats.thread_count, 0);
    assert_eq!(stats.last_block_number, None);
}
