use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use taskboard::board::{
    Board, BoardApi, BoardPhase, CardMode, ADD_FAILED, DEFAULT_LABEL_FORM_COLOR, LABEL_FAILED,
    MOVE_FAILED, UPDATE_FAILED,
};
use taskboard::{
    LabelNode, NewLabel, NewTask, TaskBoardDb, TaskBoardDbBuilder, TaskBoardError, TaskNode,
    TaskPatch, TaskStatus,
};

async fn open_db() -> TaskBoardDb {
    let _ = env_logger::builder().is_test(true).try_init();
    TaskBoardDbBuilder::new("sqlite::memory:")
        .build()
        .await
        .expect("Failed to create TaskBoardDb")
}

/// Delegates to a real store but fails every write while `broken` is set.
struct FlakyApi {
    db: TaskBoardDb,
    broken: AtomicBool,
}

impl FlakyApi {
    fn new(db: TaskBoardDb) -> Self {
        Self {
            db,
            broken: AtomicBool::new(false),
        }
    }

    fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), TaskBoardError> {
        if self.broken.load(Ordering::SeqCst) {
            Err(TaskBoardError::Transport("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BoardApi for FlakyApi {
    async fn tasks(&self) -> Result<Vec<TaskNode>, TaskBoardError> {
        self.db.tasks().await
    }

    async fn labels(&self) -> Result<Vec<LabelNode>, TaskBoardError> {
        self.db.labels().await
    }

    async fn add_task(&self, input: NewTask) -> Result<TaskNode, TaskBoardError> {
        self.check()?;
        self.db.add_task(input).await
    }

    async fn update_task_status(&self, id: i32, status: &str) -> Result<TaskNode, TaskBoardError> {
        self.check()?;
        self.db.update_task_status(id, status).await
    }

    async fn update_task_details(&self, id: i32, patch: TaskPatch) -> Result<TaskNode, TaskBoardError> {
        self.check()?;
        self.db.update_task_details(id, patch).await
    }

    async fn delete_task(&self, id: i32) -> Result<bool, TaskBoardError> {
        self.check()?;
        self.db.delete_task(id).await
    }

    async fn add_label(&self, input: NewLabel) -> Result<LabelNode, TaskBoardError> {
        self.check()?;
        self.db.add_label(input).await
    }
}

/// Fails every call, including the fetches.
struct DownApi;

#[async_trait]
impl BoardApi for DownApi {
    async fn tasks(&self) -> Result<Vec<TaskNode>, TaskBoardError> {
        Err(TaskBoardError::Transport("server unreachable".into()))
    }

    async fn labels(&self) -> Result<Vec<LabelNode>, TaskBoardError> {
        Err(TaskBoardError::Transport("server unreachable".into()))
    }

    async fn add_task(&self, _input: NewTask) -> Result<TaskNode, TaskBoardError> {
        Err(TaskBoardError::Transport("server unreachable".into()))
    }

    async fn update_task_status(&self, _id: i32, _status: &str) -> Result<TaskNode, TaskBoardError> {
        Err(TaskBoardError::Transport("server unreachable".into()))
    }

    async fn update_task_details(&self, _id: i32, _patch: TaskPatch) -> Result<TaskNode, TaskBoardError> {
        Err(TaskBoardError::Transport("server unreachable".into()))
    }

    async fn delete_task(&self, _id: i32) -> Result<bool, TaskBoardError> {
        Err(TaskBoardError::Transport("server unreachable".into()))
    }

    async fn add_label(&self, _input: NewLabel) -> Result<LabelNode, TaskBoardError> {
        Err(TaskBoardError::Transport("server unreachable".into()))
    }
}

async fn seeded_board(db: &TaskBoardDb) -> (i32, Board<&TaskBoardDb>) {
    let label = db
        .mutation()
        .add_label(NewLabel {
            name: "Work".into(),
            description: None,
            color: Some("#3B82F6".into()),
        })
        .await
        .expect("Failed to add label");
    for (title, status, label_id) in [
        ("Write report", "TODO", Some(label.id)),
        ("Buy milk", "TODO", None),
        ("Review PR", "IN_PROGRESS", Some(label.id)),
        ("Ship it", "DONE", None),
    ] {
        db.mutation()
            .add_task(NewTask {
                title: title.into(),
                description: String::new(),
                status: Some(status.into()),
                label_id,
            })
            .await
            .expect("Failed to add task");
    }

    let mut board = Board::new(db);
    board.refresh().await;
    (label.id, board)
}

fn titles(board: &Board<impl BoardApi>, status: TaskStatus) -> Vec<String> {
    board
        .columns()
        .into_iter()
        .find(|c| c.status == status)
        .map(|c| c.tasks.iter().map(|t| t.title.clone()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_columns_stats_and_label_filter() {
    let db = open_db().await;
    let (label_id, mut board) = seeded_board(&db).await;
    assert_eq!(board.phase(), &BoardPhase::Ready);

    let columns = board.columns();
    let names: Vec<_> = columns.iter().map(|c| c.title).collect();
    assert_eq!(names, ["To Do", "In Progress", "Done"]);
    assert_eq!(columns[0].tasks.len(), 2);

    board.set_label_filter(Some(label_id));
    assert_eq!(titles(&board, TaskStatus::Todo), ["Write report"]);
    assert_eq!(titles(&board, TaskStatus::InProgress), ["Review PR"]);
    assert!(titles(&board, TaskStatus::Done).is_empty());

    // Stats ignore the filter.
    let stats = board.stats();
    assert_eq!((stats.todo, stats.in_progress, stats.done), (2, 1, 1));

    let labelled = board
        .tasks()
        .iter()
        .find(|t| t.title == "Write report")
        .cloned()
        .expect("task loaded");
    let chip = board.label_chip(&labelled).expect("chip for labelled task");
    assert_eq!(chip.text, "Work");
    assert_eq!(chip.background, "rgba(59, 130, 246, 0.1)");
    assert_eq!(chip.border, "1px solid #3B82F6");
}

#[tokio::test]
async fn test_drop_moves_card_after_refetch() {
    let db = open_db().await;
    let (_, mut board) = seeded_board(&db).await;
    let id = board
        .tasks()
        .iter()
        .find(|t| t.title == "Buy milk")
        .map(|t| t.id)
        .expect("task loaded");

    board.drop_card(id, Some(TaskStatus::Done)).await;
    assert_eq!(board.phase(), &BoardPhase::Ready);
    assert!(titles(&board, TaskStatus::Done).contains(&"Buy milk".to_string()));
    assert!(board.alerts().is_empty());

    // Dropped outside any column: nothing happens.
    board.drop_card(id, None).await;
    assert!(titles(&board, TaskStatus::Done).contains(&"Buy milk".to_string()));
}

#[tokio::test]
async fn test_failed_move_alerts_and_keeps_server_state() {
    let db = open_db().await;
    let (_, _) = seeded_board(&db).await;
    let api = FlakyApi::new(db);
    let mut board = Board::new(&api);
    board.refresh().await;
    let id = board
        .tasks()
        .iter()
        .find(|t| t.title == "Buy milk")
        .map(|t| t.id)
        .expect("task loaded");

    api.set_broken(true);
    board.drop_card(id, Some(TaskStatus::Done)).await;

    assert_eq!(board.phase(), &BoardPhase::Ready);
    assert_eq!(board.take_alerts(), [MOVE_FAILED]);
    assert!(board.alerts().is_empty());
    assert!(titles(&board, TaskStatus::Todo).contains(&"Buy milk".to_string()));
}

#[tokio::test]
async fn test_edit_save_and_failed_save() {
    let db = open_db().await;
    let (_, _) = seeded_board(&db).await;
    let api = FlakyApi::new(db);
    let mut board = Board::new(&api);
    board.refresh().await;
    let id = board
        .tasks()
        .iter()
        .find(|t| t.title == "Write report")
        .map(|t| t.id)
        .expect("task loaded");

    assert!(board.begin_edit(id));
    assert_eq!(board.card_mode(id), CardMode::Editing);
    let draft = board.edit_draft_mut().expect("draft");
    draft.title = "Write final report".into();
    draft.label_id = None;

    api.set_broken(true);
    assert!(!board.save_edit().await);
    assert_eq!(board.card_mode(id), CardMode::Editing);
    assert_eq!(
        board.edit_draft().map(|d| d.title.as_str()),
        Some("Write final report")
    );
    assert_eq!(board.take_alerts(), [UPDATE_FAILED]);

    api.set_broken(false);
    assert!(board.save_edit().await);
    assert_eq!(board.card_mode(id), CardMode::Viewing);
    let saved = board.tasks().iter().find(|t| t.id == id).expect("task loaded");
    assert_eq!(saved.title, "Write final report");
    assert_eq!(saved.label_id, None);

    assert!(board.begin_edit(id));
    board.cancel_edit();
    assert_eq!(board.card_mode(id), CardMode::Viewing);
}

#[tokio::test]
async fn test_add_task_dialog() {
    let db = open_db().await;
    let api = FlakyApi::new(db);
    let mut board = Board::new(&api);
    board.refresh().await;

    board.open_new_task(TaskStatus::InProgress);
    assert_eq!(board.new_task_status(), Some(TaskStatus::InProgress));

    // Blank titles are ignored.
    board.new_task_draft_mut().expect("dialog open").title = "   ".into();
    assert!(!board.submit_new_task().await);
    assert!(board.alerts().is_empty());

    board.new_task_draft_mut().expect("dialog open").title = "New card".into();
    api.set_broken(true);
    assert!(!board.submit_new_task().await);
    assert_eq!(board.take_alerts(), [ADD_FAILED]);
    assert_eq!(board.new_task_status(), Some(TaskStatus::InProgress));

    api.set_broken(false);
    assert!(board.submit_new_task().await);
    assert_eq!(board.new_task_status(), None);
    assert_eq!(titles(&board, TaskStatus::InProgress), ["New card"]);
}

#[tokio::test]
async fn test_delete_card() {
    let db = open_db().await;
    let (_, mut board) = seeded_board(&db).await;
    let id = board.tasks()[0].id;

    assert!(board.delete_card(id).await);
    assert!(board.tasks().iter().all(|t| t.id != id));
    assert_eq!(board.stats().todo + board.stats().in_progress + board.stats().done, 3);
}

#[tokio::test]
async fn test_label_form() {
    let db = open_db().await;
    let api = FlakyApi::new(db);
    let mut board = Board::new(&api);
    board.refresh().await;
    assert_eq!(board.label_form().color, DEFAULT_LABEL_FORM_COLOR);

    assert!(!board.submit_label().await);

    board.label_form_mut().name = "Errands".into();
    api.set_broken(true);
    assert!(!board.submit_label().await);
    assert_eq!(board.take_alerts(), [LABEL_FAILED]);
    assert_eq!(board.label_form().name, "Errands");

    api.set_broken(false);
    assert!(board.submit_label().await);
    assert_eq!(board.label_form().name, "");
    let label = &board.labels()[0];
    assert_eq!(label.name, "Errands");
    assert_eq!(label.description, None);
    assert_eq!(label.color, DEFAULT_LABEL_FORM_COLOR);
}

#[tokio::test]
async fn test_unreachable_server_fails_board() {
    let mut board = Board::new(DownApi);
    assert_eq!(board.phase(), &BoardPhase::Loading);

    board.refresh().await;
    assert!(matches!(board.phase(), BoardPhase::Failed(msg) if msg.contains("server unreachable")));
    assert!(board.columns().iter().all(|c| c.tasks.is_empty()));
}
