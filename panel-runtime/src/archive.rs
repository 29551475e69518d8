//! # Archive 模块
//!
//! 持久化的游戏记录：计数、开关、平均值，以及按得分排序的历史成绩。
//!
//! ## 设计原则
//!
//! - 只有 Core 修改 Archive，其他 Task 通过 [`ArchiveView`] 只读访问
//! - 存储介质由 [`ArchiveStore`] 注入，运行时本身不做文件 IO
//! - 带版本号；版本不同的存档照常读取，缺失的键用默认值补齐

use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::error::{ArchiveError, OrViolation};

/// 历史成绩保留条数
pub const RANKING_SIZE: usize = 10;

/// 一局游戏的得分明细（由玩法层产出）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Score {
    /// 总分
    pub total_score: u32,
    /// 评价（半星为单位，0 - 10）
    pub total_ranking: u32,
    /// 是否完美
    pub perfect: bool,
    /// 各类得分（道、森林、草原、...、街、教会）
    pub scores: Vec<u32>,
    /// 每片森林的得分
    pub forest: Vec<u32>,
    /// 每条道路的得分
    pub path: Vec<u32>,
    /// 放置的面板数
    pub total_panels: u32,
    /// 旋转次数
    pub panel_turned_times: u32,
    /// 移动次数
    pub panel_moved_times: u32,
    /// 平均放置耗时（秒）
    pub put_time: f64,
}

/// 历史成绩中的一条
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRecord {
    pub score: u32,
    pub rank: u32,
    pub total_panels: u32,
    pub perfect: bool,
}

impl From<&Score> for GameRecord {
    fn from(score: &Score) -> Self {
        Self {
            score: score.total_score,
            rank: score.total_ranking,
            total_panels: score.total_panels,
            perfect: score.perfect,
        }
    }
}

/// 记录值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Bool(bool),
    UInt(u32),
    Float(f64),
}

impl Record {
    fn type_name(&self) -> &'static str {
        match self {
            Record::Bool(_) => "bool",
            Record::UInt(_) => "uint",
            Record::Float(_) => "float",
        }
    }
}

/// 可存入记录的类型
pub trait RecordValue: Copy {
    const TYPE_NAME: &'static str;

    fn from_record(record: &Record) -> Option<Self>;
    fn into_record(self) -> Record;
}

impl RecordValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_record(record: &Record) -> Option<Self> {
        match record {
            Record::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn into_record(self) -> Record {
        Record::Bool(self)
    }
}

impl RecordValue for u32 {
    const TYPE_NAME: &'static str = "uint";

    fn from_record(record: &Record) -> Option<Self> {
        match record {
            Record::UInt(v) => Some(*v),
            _ => None,
        }
    }

    fn into_record(self) -> Record {
        Record::UInt(self)
    }
}

impl RecordValue for f64 {
    const TYPE_NAME: &'static str = "float";

    fn from_record(record: &Record) -> Option<Self> {
        match record {
            Record::Float(v) => Some(*v),
            _ => None,
        }
    }

    fn into_record(self) -> Record {
        Record::Float(self)
    }
}

/// 记录的默认值表
///
/// 只有出现在这里的键才能读写。
pub fn default_records() -> BTreeMap<String, Record> {
    let counters = [
        "play-times",
        "total-panels",
        "panel-turned-times",
        "panel-moved-times",
        "share-times",
        "startup-times",
        "abort-times",
    ];
    let averages = [
        "average-score",
        "average-put-panels",
        "average-moved-times",
        "average-turn-times",
        "average-put-time",
    ];

    let mut records = BTreeMap::new();
    for key in counters {
        records.insert(key.to_string(), Record::UInt(0));
    }
    for key in averages {
        records.insert(key.to_string(), Record::Float(0.0));
    }
    records.insert("bgm-enable".to_string(), Record::Bool(true));
    records.insert("se-enable".to_string(), Record::Bool(true));
    records.insert("tutorial-finish".to_string(), Record::Bool(false));
    records
}

/// 持久化的数据本体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveData {
    /// 写入时的应用版本
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub records: BTreeMap<String, Record>,
    /// 历史成绩（得分降序，最多 [`RANKING_SIZE`] 条）
    #[serde(default)]
    pub games: Vec<GameRecord>,
}

impl ArchiveData {
    fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            records: default_records(),
            games: Vec::new(),
        }
    }
}

/// 存储后端
pub trait ArchiveStore {
    /// 读取已保存的内容；从未保存过返回 `None`
    fn load(&self) -> Result<Option<String>, ArchiveError>;

    /// 写入内容
    fn save(&mut self, content: &str) -> Result<(), ArchiveError>;
}

/// 内存存储（测试与无盘运行用）
///
/// 克隆体共享同一份内容，便于在外部检查保存结果。
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    content: Rc<RefCell<Option<String>>>,
    save_count: Rc<RefCell<u32>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以已有内容创建
    pub fn with_content(content: impl Into<String>) -> Self {
        let store = Self::default();
        *store.content.borrow_mut() = Some(content.into());
        store
    }

    /// 当前内容
    pub fn content(&self) -> Option<String> {
        self.content.borrow().clone()
    }

    /// 保存次数
    pub fn save_count(&self) -> u32 {
        *self.save_count.borrow()
    }
}

impl ArchiveStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, ArchiveError> {
        Ok(self.content.borrow().clone())
    }

    fn save(&mut self, content: &str) -> Result<(), ArchiveError> {
        *self.content.borrow_mut() = Some(content.to_string());
        *self.save_count.borrow_mut() += 1;
        Ok(())
    }
}

/// 游戏记录
pub struct Archive {
    data: ArchiveData,
    /// 最后一次读写存储时的内容
    persisted: Option<ArchiveData>,
    store: Box<dyn ArchiveStore>,
}

impl fmt::Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("data", &self.data)
            .field("saved", &self.is_saved())
            .finish()
    }
}

impl Archive {
    /// 从存储读取
    ///
    /// 读取失败或内容损坏时以默认值开始（记录警告），不会中断启动。
    pub fn load(store: Box<dyn ArchiveStore>, version: &str) -> Self {
        let stored = match store.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "读取存档失败，使用默认记录");
                None
            }
        };

        let Some(text) = stored else {
            debug!("没有存档，使用默认记录");
            return Self {
                data: ArchiveData::new(version),
                persisted: None,
                store,
            };
        };

        match serde_json::from_str::<ArchiveData>(&text) {
            Ok(mut data) => {
                let persisted = data.clone();
                if data.version != version {
                    info!(from = %data.version, to = version, "存档版本不同，补齐缺失记录");
                    data.version = version.to_string();
                }
                for (key, value) in default_records() {
                    data.records.entry(key).or_insert(value);
                }
                normalize_games(&mut data.games);

                Self {
                    data,
                    persisted: Some(persisted),
                    store,
                }
            }
            Err(e) => {
                warn!(error = %e, "存档解析失败，使用默认记录");
                Self {
                    data: ArchiveData::new(version),
                    persisted: None,
                    store,
                }
            }
        }
    }

    /// 读取记录
    pub fn try_record<T: RecordValue>(&self, key: &str) -> Result<T, ArchiveError> {
        let record = self
            .data
            .records
            .get(key)
            .ok_or_else(|| ArchiveError::UnknownRecord(key.to_string()))?;

        T::from_record(record).ok_or_else(|| ArchiveError::RecordType {
            key: key.to_string(),
            expected: T::TYPE_NAME,
        })
    }

    /// 读取记录（键或类型错误为契约违反）
    #[track_caller]
    pub fn record<T: RecordValue>(&self, key: &str) -> T {
        self.try_record(key).or_violation()
    }

    /// 写入记录
    ///
    /// 键必须是已知记录，且类型与默认值一致。
    pub fn set_record<T: RecordValue>(&mut self, key: &str, value: T) -> Result<(), ArchiveError> {
        let record = self
            .data
            .records
            .get_mut(key)
            .ok_or_else(|| ArchiveError::UnknownRecord(key.to_string()))?;

        let new_record = value.into_record();
        let compatible = match (*record, new_record) {
            (Record::Bool(_), Record::Bool(_))
            | (Record::UInt(_), Record::UInt(_))
            | (Record::Float(_), Record::Float(_)) => true,
            _ => false,
        };
        if !compatible {
            return Err(ArchiveError::RecordType {
                key: key.to_string(),
                expected: record.type_name(),
            });
        }

        *record = new_record;
        Ok(())
    }

    /// 计数器加上增量
    pub fn add_record(&mut self, key: &str, delta: u32) -> Result<u32, ArchiveError> {
        let value = self.try_record::<u32>(key)?.saturating_add(delta);
        self.set_record(key, value)?;
        Ok(value)
    }

    /// 历史成绩（得分降序）
    pub fn games(&self) -> &[GameRecord] {
        &self.data.games
    }

    /// 是否已有排行记录
    pub fn exists_ranking(&self) -> bool {
        !self.data.games.is_empty()
    }

    /// 插入一条成绩，返回名次（0 起）；未进入前 [`RANKING_SIZE`] 返回 `None`
    ///
    /// 同分时新成绩排在旧成绩之后。
    pub fn insert_game(&mut self, game: GameRecord) -> Option<usize> {
        let position = ranking_position(&self.data.games, game.score);
        if position >= RANKING_SIZE {
            return None;
        }
        self.data.games.insert(position, game);
        self.data.games.truncate(RANKING_SIZE);
        Some(position)
    }

    /// 记录一局游戏：更新计数与平均值，插入历史成绩
    pub fn record_game(&mut self, score: &Score) -> Result<Option<usize>, ArchiveError> {
        let play_times = self.add_record("play-times", 1)?;
        self.add_record("total-panels", score.total_panels)?;
        self.add_record("panel-turned-times", score.panel_turned_times)?;
        self.add_record("panel-moved-times", score.panel_moved_times)?;

        let samples = [
            ("average-score", f64::from(score.total_score)),
            ("average-put-panels", f64::from(score.total_panels)),
            ("average-moved-times", f64::from(score.panel_moved_times)),
            ("average-turn-times", f64::from(score.panel_turned_times)),
            ("average-put-time", score.put_time),
        ];
        for (key, sample) in samples {
            let average = self.try_record::<f64>(key)?;
            let average = average + (sample - average) / f64::from(play_times);
            self.set_record(key, average)?;
        }

        Ok(self.insert_game(GameRecord::from(score)))
    }

    /// 写入存储
    pub fn save(&mut self) -> Result<(), ArchiveError> {
        let text = serde_json::to_string_pretty(&self.data)
            .map_err(|e| ArchiveError::Serialization(e.to_string()))?;
        self.store.save(&text)?;
        self.persisted = Some(self.data.clone());
        debug!("存档已保存");
        Ok(())
    }

    /// 内存中的状态是否与最后一次持久化的一致
    pub fn is_saved(&self) -> bool {
        self.persisted.as_ref() == Some(&self.data)
    }

    pub fn version(&self) -> &str {
        &self.data.version
    }

    /// 数据快照
    pub fn data(&self) -> &ArchiveData {
        &self.data
    }
}

/// 按得分计算名次：得分严格更高或相同的旧成绩都排在前面
pub fn ranking_position(games: &[GameRecord], score: u32) -> usize {
    games.iter().filter(|g| g.score >= score).count()
}

fn normalize_games(games: &mut Vec<GameRecord>) {
    // 稳定排序，保留同分成绩的先后
    games.sort_by(|a, b| b.score.cmp(&a.score));
    games.truncate(RANKING_SIZE);
}

/// Archive 的只读视图
///
/// 交给需要读取记录的 Task（例如后台的 MainPart）。
#[derive(Debug, Clone)]
pub struct ArchiveView {
    inner: Rc<RefCell<Archive>>,
}

impl ArchiveView {
    pub fn new(inner: Rc<RefCell<Archive>>) -> Self {
        Self { inner }
    }

    /// 借出只读引用
    pub fn borrow(&self) -> Ref<'_, Archive> {
        self.inner.borrow()
    }

    /// 历史成绩快照
    pub fn games(&self) -> Vec<GameRecord> {
        self.inner.borrow().games().to_vec()
    }
}
