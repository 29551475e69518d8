//! # Canvas 模块
//!
//! 一个画面的 Widget 树、按标识符的查找表和 Tween 注册表。
//!
//! ## 输入
//!
//! Canvas 订阅总线上的 `touch_began` / `touch_moved` / `touch_ended`，
//! 对带交互事件的 Widget 做命中判定（后绘制的优先），再以 Widget 的事件名发出：
//!
//! | 信号 | 时机 |
//! |------|------|
//! | `<event>:touch_began` | 在 Widget 内按下 |
//! | `<event>:moved_out` / `<event>:moved_in` | 按住时移出/移回 |
//! | `<event>:touch_ended` | 在 Widget 内松开 |
//! | `<event>:canceled` | 在 Widget 外松开 |
//!
//! ## 借用
//!
//! 内部状态在 `RefCell` 中。所有信号都在释放借用之后发出，
//! 处理器可以直接回到 Canvas 上操作。

use serde::Deserialize;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

use super::tween::{RunningTween, TweenCommon, TweenDesc};
use super::{Color, Drawer, ParamValue, Rect, Vec2, Widget, WidgetDesc};
use crate::error::{OrViolation, UiError};
use crate::event::{
    Arguments, ConnectionHolder, EventBus, Message, TouchBegan, TouchEnded, TouchMoved, UiSound,
};

/// Canvas 的声明式描述
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CanvasDesc {
    pub widget: WidgetDesc,
    #[serde(default)]
    pub tween: BTreeMap<String, TweenDesc>,
}

/// 正在追踪的触摸
#[derive(Debug)]
struct Tracking {
    path: Vec<usize>,
    event: String,
    inside: bool,
}

#[derive(Debug, Clone, Copy)]
enum TouchPhase {
    Began,
    Moved,
    Ended,
}

struct CanvasState {
    root: Widget,
    ids: HashMap<String, Vec<usize>>,
    tweens: HashMap<String, TweenDesc>,
    running: Vec<RunningTween>,
    active: bool,
    tracking: Option<Tracking>,
}

/// 深度优先遍历，附带子节点索引路径
fn walk<'a>(widget: &'a Widget, path: &mut Vec<usize>, f: &mut dyn FnMut(&[usize], &'a Widget)) {
    f(path, widget);
    for (i, child) in widget.children().iter().enumerate() {
        path.push(i);
        walk(child, path, f);
        path.pop();
    }
}

impl CanvasState {
    fn widget(&self, id: &str) -> Result<&Widget, UiError> {
        self.ids
            .get(id)
            .and_then(|path| self.root.descendant(path))
            .ok_or_else(|| UiError::UnknownWidget(id.to_string()))
    }

    fn widget_mut(&mut self, id: &str) -> Result<&mut Widget, UiError> {
        self.ids
            .get(id)
            .and_then(|path| self.root.descendant_mut(path))
            .ok_or_else(|| UiError::UnknownWidget(id.to_string()))
    }

    fn path(&self, id: &str) -> Result<Vec<usize>, UiError> {
        self.ids
            .get(id)
            .cloned()
            .ok_or_else(|| UiError::UnknownWidget(id.to_string()))
    }

    /// 加入播放列表
    ///
    /// 只替换驱动同一 Widget 同一参数的轨道：同一个 Tween 换了目标后再次启动，
    /// 之前目标上的动画继续播放。轨道全被替换的 Tween 直接丢弃（不发结束事件）。
    fn replace_running(&mut self, tween: RunningTween) {
        self.running.retain_mut(|running| running.yield_to(&tween));
        self.running.push(tween);
    }

    /// 满足条件且包含 `pos` 的最上层 Widget
    fn hit(&self, pos: Vec2, pred: impl Fn(&Widget) -> bool) -> Option<(Vec<usize>, String)> {
        let mut found = None;
        walk(&self.root, &mut Vec::new(), &mut |path, widget| {
            if pred(widget) && widget.contains(pos) {
                if let Some(event) = widget.event() {
                    found = Some((path.to_vec(), event.to_string()));
                }
            }
        });
        found
    }

    /// 开始追踪时的信号（含触摸音效）
    fn begin_tracking(&mut self, path: Vec<usize>, event: String, suffix: &str) -> Vec<(String, Arguments)> {
        let mut signals = vec![(format!("{event}:{suffix}"), Arguments::new())];
        if let Some(se) = self.root.descendant(&path).and_then(Widget::se) {
            let sound = UiSound {
                name: se.to_string(),
            };
            signals.push((UiSound::NAME.to_string(), sound.to_arguments()));
        }
        self.tracking = Some(Tracking {
            path,
            event,
            inside: true,
        });
        signals
    }

    fn tracked_contains(&self, tracking: &Tracking, pos: Vec2) -> bool {
        self.root
            .descendant(&tracking.path)
            .is_some_and(|w| w.contains(pos))
    }

    /// 处理一次触摸，返回要发出的信号
    fn touch(&mut self, phase: TouchPhase, pos: Vec2) -> Vec<(String, Arguments)> {
        match phase {
            TouchPhase::Began => {
                if !self.active {
                    return Vec::new();
                }
                match self.hit(pos, Widget::has_event) {
                    Some((path, event)) => self.begin_tracking(path, event, "touch_began"),
                    None => Vec::new(),
                }
            }
            TouchPhase::Moved => {
                if let Some(mut tracking) = self.tracking.take() {
                    let inside = self.tracked_contains(&tracking, pos);
                    let mut signals = Vec::new();
                    if inside != tracking.inside {
                        tracking.inside = inside;
                        let suffix = if inside { "moved_in" } else { "moved_out" };
                        signals.push((format!("{}:{suffix}", tracking.event), Arguments::new()));
                    }
                    self.tracking = Some(tracking);
                    return signals;
                }
                if !self.active {
                    return Vec::new();
                }
                // 拖动进入追踪移动的 Widget
                match self.hit(pos, |w| w.has_event() && w.react_move_event()) {
                    Some((path, event)) => self.begin_tracking(path, event, "moved_in"),
                    None => Vec::new(),
                }
            }
            TouchPhase::Ended => match self.tracking.take() {
                Some(tracking) => {
                    let inside = self.active && self.tracked_contains(&tracking, pos);
                    let suffix = if inside { "touch_ended" } else { "canceled" };
                    vec![(format!("{}:{suffix}", tracking.event), Arguments::new())]
                }
                None => Vec::new(),
            },
        }
    }
}

/// Canvas
pub struct Canvas {
    state: Rc<RefCell<CanvasState>>,
    bus: EventBus,
    common: Rc<TweenCommon>,
    /// 画面矩形 (0, 0) - (w, h)
    screen: Rect,
    _connections: ConnectionHolder,
}

impl fmt::Debug for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Canvas")
            .field("widgets", &state.ids.len())
            .field("running", &state.running.len())
            .field("active", &state.active)
            .finish()
    }
}

impl Canvas {
    /// 由描述创建
    ///
    /// 声明为不显示的分支会在第一次绘制前关闭；标识符重复是配置错误。
    pub fn new(
        bus: &EventBus,
        desc: &CanvasDesc,
        common: Rc<TweenCommon>,
        camera_size: Vec2,
        safe_area: bool,
    ) -> Result<Self, UiError> {
        let mut root = Widget::from_desc(&desc.widget, safe_area);
        root.check_inactive();

        let mut ids = HashMap::new();
        let mut duplicate = None;
        walk(&root, &mut Vec::new(), &mut |path, widget| {
            if let Some(id) = widget.identifier() {
                if ids.insert(id.to_string(), path.to_vec()).is_some() {
                    duplicate.get_or_insert_with(|| id.to_string());
                }
            }
        });
        if let Some(id) = duplicate {
            return Err(UiError::DuplicateIdentifier(id));
        }

        let state = Rc::new(RefCell::new(CanvasState {
            root,
            ids,
            tweens: desc.tween.clone().into_iter().collect(),
            running: Vec::new(),
            active: true,
            tracking: None,
        }));

        let connections = ConnectionHolder::new();
        connections.add(Self::forward::<TouchBegan>(bus, &state, TouchPhase::Began, |m| m.pos));
        connections.add(Self::forward::<TouchMoved>(bus, &state, TouchPhase::Moved, |m| m.pos));
        connections.add(Self::forward::<TouchEnded>(bus, &state, TouchPhase::Ended, |m| m.pos));

        Ok(Self {
            state,
            bus: bus.clone(),
            common,
            screen: Rect::from_size(camera_size),
            _connections: connections,
        })
    }

    fn forward<M: Message + 'static>(
        bus: &EventBus,
        state: &Rc<RefCell<CanvasState>>,
        phase: TouchPhase,
        pos: fn(&M) -> Vec2,
    ) -> crate::event::Connection {
        let weak: Weak<RefCell<CanvasState>> = Rc::downgrade(state);
        let signal_bus = bus.clone();
        bus.subscribe::<M, _>(move |_, message| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let signals = state.borrow_mut().touch(phase, pos(&message));
            for (event, args) in signals {
                trace!(event = %event, "UI 事件");
                signal_bus.signal(&event, &args);
            }
        })
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// 画面尺寸
    pub fn size(&self) -> Vec2 {
        self.screen.size()
    }

    /// 归一化设备坐标（[-1, 1]，y 向上）转为画面坐标（原点左上，y 向下）
    pub fn ndc_to_pos(&self, ndc: Vec2) -> Vec2 {
        let size = self.screen.size();
        Vec2::new((ndc.x + 1.0) * 0.5 * size.x, (1.0 - ndc.y) * 0.5 * size.y)
    }

    // ========== Widget ==========

    pub fn contains_widget(&self, id: &str) -> bool {
        self.state.borrow().ids.contains_key(id)
    }

    /// 按标识符取 Widget
    ///
    /// 持有返回值期间不要发信号或操作本 Canvas。
    pub fn try_at(&self, id: &str) -> Result<Ref<'_, Widget>, UiError> {
        Ref::filter_map(self.state.borrow(), |s| s.widget(id).ok())
            .map_err(|_| UiError::UnknownWidget(id.to_string()))
    }

    pub fn at(&self, id: &str) -> Ref<'_, Widget> {
        self.try_at(id).or_violation()
    }

    pub fn try_at_mut(&self, id: &str) -> Result<RefMut<'_, Widget>, UiError> {
        RefMut::filter_map(self.state.borrow_mut(), |s| s.widget_mut(id).ok())
            .map_err(|_| UiError::UnknownWidget(id.to_string()))
    }

    pub fn at_mut(&self, id: &str) -> RefMut<'_, Widget> {
        self.try_at_mut(id).or_violation()
    }

    pub fn try_set_widget_param(
        &self,
        id: &str,
        name: &str,
        value: impl Into<ParamValue>,
    ) -> Result<(), UiError> {
        self.state.borrow_mut().widget_mut(id)?.set_param(name, value.into())
    }

    /// 设置参数
    pub fn set_widget_param(&self, id: &str, name: &str, value: impl Into<ParamValue>) {
        self.try_set_widget_param(id, name, value).or_violation();
    }

    pub fn try_get_widget_param(&self, id: &str, name: &str) -> Result<ParamValue, UiError> {
        self.state.borrow().widget(id)?.get_param(name)
    }

    /// 读取参数（副本）
    pub fn get_widget_param(&self, id: &str, name: &str) -> ParamValue {
        self.try_get_widget_param(id, name).or_violation()
    }

    /// 读出、修改、写回
    pub fn modify_widget_param<F>(&self, id: &str, name: &str, f: F)
    where
        F: FnOnce(&mut ParamValue),
    {
        let result = self.state.borrow_mut().widget_mut(id).and_then(|w| w.modify_param(name, f));
        result.or_violation();
    }

    /// 设置文字
    pub fn set_widget_text(&self, id: &str, text: impl Into<String>) {
        self.set_widget_param(id, "text", text.into());
    }

    pub fn try_enable_widget(&self, id: &str, enable: bool) -> Result<(), UiError> {
        self.state.borrow_mut().widget_mut(id)?.enable(enable);
        Ok(())
    }

    /// 显示开关
    pub fn enable_widget(&self, id: &str, enable: bool) {
        self.try_enable_widget(id, enable).or_violation();
    }

    /// Widget 是否实际显示
    pub fn is_widget_enable(&self, id: &str) -> bool {
        self.at(id).is_effective_enable()
    }

    /// 交互开关（Widget 级）
    pub fn active_widget(&self, id: &str, active: bool) {
        let result = self.state.borrow_mut().widget_mut(id).map(|w| w.active(active));
        result.or_violation();
    }

    /// 交互开关（整个 Canvas）
    pub fn active(&self, active: bool) {
        self.state.borrow_mut().active = active;
    }

    pub fn is_active(&self) -> bool {
        self.state.borrow().active
    }

    // ========== Tween ==========

    fn start_named(&self, name: &str, on_complete: Option<String>) -> Result<(), UiError> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;

        let desc = state
            .tweens
            .get(name)
            .ok_or_else(|| UiError::UnknownTween(name.to_string()))?;
        let mut targets = Vec::with_capacity(desc.len());
        for target in desc {
            let path = state
                .ids
                .get(&target.target)
                .cloned()
                .ok_or_else(|| UiError::UnknownWidget(target.target.clone()))?;
            targets.push((path, target.tracks.as_slice()));
        }

        let tween = RunningTween::start(&mut state.root, name.to_string(), targets, on_complete)?;
        state.replace_running(tween);
        debug!(tween = name, "Tween 开始");
        Ok(())
    }

    pub fn try_start_tween(&self, name: &str) -> Result<(), UiError> {
        self.start_named(name, None)
    }

    /// 启动 Tween（播放中则从头开始）
    pub fn start_tween(&self, name: &str) {
        self.try_start_tween(name).or_violation();
    }

    /// 启动 Tween，结束时发出 `event`
    pub fn start_tween_then(&self, name: &str, event: &str) {
        self.start_named(name, Some(event.to_string())).or_violation();
    }

    /// 停止 Tween（所有目标上的），参数保持当前值
    pub fn stop_tween(&self, name: &str) {
        self.state.borrow_mut().running.retain(|t| t.key != name);
    }

    pub fn is_tween_running(&self, name: &str) -> bool {
        self.state.borrow().running.iter().any(|t| t.key == name)
    }

    /// 是否有 Tween 在播放
    pub fn has_running_tween(&self) -> bool {
        !self.state.borrow().running.is_empty()
    }

    pub fn try_set_tween_target(&self, id: &str, tween: &str, index: usize) -> Result<(), UiError> {
        let mut state = self.state.borrow_mut();
        state.path(id)?;
        let desc = state
            .tweens
            .get_mut(tween)
            .ok_or_else(|| UiError::UnknownTween(tween.to_string()))?;
        let len = desc.len();
        let target = desc.get_mut(index).ok_or_else(|| UiError::TweenIndex {
            tween: tween.to_string(),
            index,
            len,
        })?;
        target.target = id.to_string();
        Ok(())
    }

    /// 把 Tween 的第 `index` 个目标改为 `id`（之后的启动都生效）
    pub fn set_tween_target(&self, id: &str, tween: &str, index: usize) {
        self.try_set_tween_target(id, tween, index).or_violation();
    }

    fn start_common(&self, id: &str, name: &str, on_complete: Option<String>) -> Result<(), UiError> {
        let tracks = self.common.get(name)?;
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let path = state.path(id)?;

        let key = format!("{id}@common");
        let tween = RunningTween::start(&mut state.root, key, [(path, tracks)], on_complete)?;
        state.replace_running(tween);
        debug!(widget = id, tween = name, "公共 Tween 开始");
        Ok(())
    }

    pub fn try_start_common_tween(&self, id: &str, name: &str) -> Result<(), UiError> {
        self.start_common(id, name, None)
    }

    /// 对 Widget 启动公共 Tween
    pub fn start_common_tween(&self, id: &str, name: &str) {
        self.try_start_common_tween(id, name).or_violation();
    }

    /// 对 Widget 启动公共 Tween，结束时发出 `event`
    pub fn start_common_tween_then(&self, id: &str, name: &str, event: &str) {
        self.start_common(id, name, Some(event.to_string())).or_violation();
    }

    // ========== 帧 ==========

    /// 推进 Tween，结束事件在释放借用后发出
    pub fn update(&self, delta_time: f64) {
        let completed = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let root = &mut state.root;
            let mut completed = Vec::new();
            state.running.retain_mut(|tween| {
                if tween.update(root, delta_time as f32) {
                    return true;
                }
                trace!(tween = %tween.key, "Tween 结束");
                if let Some(event) = tween.on_complete.take() {
                    completed.push(event);
                }
                false
            });
            completed
        };

        for event in completed {
            self.bus.notify(&event);
        }
    }

    /// 绘制整棵树
    pub fn draw(&self, drawer: &mut dyn Drawer) {
        let mut state = self.state.borrow_mut();
        state.root.draw(self.screen, drawer, 1.0);
        if cfg!(debug_assertions) {
            state.root.debug_draw(drawer);
        }
    }

    /// 显示中的 Widget 的画面矩形与调试边框颜色
    pub fn debug_rects(&self) -> Vec<(Rect, Color)> {
        let state = self.state.borrow();
        let mut rects = Vec::new();
        state.root.visit(&mut |w| {
            if w.is_effective_enable() {
                rects.push((w.disp_rect(), w.frame_color()));
            }
        });
        rects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::RecordingDrawer;
    use std::cell::RefCell as StdRefCell;

    const DESC: &str = r#"{
        "widget": {
            "anchor": [[0, 0], [1, 1]],
            "base": { "type": "rect", "color": [0, 0, 0] },
            "children": [
                { "identifier": "title", "rect": [-50, -10, 50, 10],
                  "base": { "type": "text", "text": "PANEL" } },
                { "identifier": "agree", "rect": [-20, -10, 20, 10],
                  "anchor": [[1, 1], [1, 1]], "offset": [-30, -20], "alpha": 0.5,
                  "event": "agree", "se": "select",
                  "base": { "type": "image", "image": "button" } },
                { "identifier": "hidden", "enable": false,
                  "base": { "type": "text", "text": "hidden" },
                  "children": [ { "identifier": "inner", "base": { "type": "text", "text": "x" } } ] }
            ]
        },
        "tween": {
            "fade": [ { "target": "title", "tracks": [
                { "param": "alpha", "from": 0, "to": 1, "duration": 0.5 }
            ] } ]
        }
    }"#;

    fn common() -> Rc<TweenCommon> {
        Rc::new(
            serde_json::from_str(
                r#"{ "touch-in": [ { "param": "scale", "to": 0.9, "duration": 0.1 } ] }"#,
            )
            .unwrap(),
        )
    }

    fn canvas(bus: &EventBus) -> Canvas {
        let desc: CanvasDesc = serde_json::from_str(DESC).unwrap();
        Canvas::new(bus, &desc, common(), Vec2::new(200.0, 100.0), false).unwrap()
    }

    fn record(bus: &EventBus, events: &[&str]) -> Rc<StdRefCell<Vec<String>>> {
        let log = Rc::new(StdRefCell::new(Vec::new()));
        for event in events {
            let log = log.clone();
            let name = event.to_string();
            let _ = bus.connect(*event, move |_, _| log.borrow_mut().push(name.clone()));
        }
        log
    }

    #[test]
    fn test_draw_list() {
        let bus = EventBus::new();
        let canvas = canvas(&bus);
        let mut drawer = RecordingDrawer::new();
        canvas.draw(&mut drawer);

        insta::assert_snapshot!(drawer.to_text(), @r#"
        rect  [0.0, 0.0, 200.0, 100.0] a=1.00
        text  [50.0, 40.0, 150.0, 60.0] a=1.00 "PANEL"
        image [150.0, 70.0, 190.0, 90.0] a=0.50 button
        "#);
    }

    #[test]
    fn test_inactive_branch_disabled_on_build() {
        let bus = EventBus::new();
        let canvas = canvas(&bus);
        assert!(!canvas.is_widget_enable("inner"));
        assert!(canvas.at("inner").is_enable());

        canvas.enable_widget("hidden", true);
        assert!(canvas.is_widget_enable("inner"));
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let desc: CanvasDesc = serde_json::from_str(
            r#"{ "widget": { "children": [ { "identifier": "a" }, { "identifier": "a" } ] } }"#,
        )
        .unwrap();
        let err = Canvas::new(&EventBus::new(), &desc, common(), Vec2::one(), false).unwrap_err();
        assert_eq!(err, UiError::DuplicateIdentifier("a".to_string()));
    }

    #[test]
    fn test_touch_inside_and_outside() {
        let bus = EventBus::new();
        let canvas = canvas(&bus);
        canvas.draw(&mut RecordingDrawer::new());
        let log = record(
            &bus,
            &["agree:touch_began", "UI:sound", "agree:moved_out", "agree:touch_ended", "agree:canceled"],
        );

        let inside = Vec2::new(170.0, 80.0);
        let outside = Vec2::new(10.0, 10.0);

        bus.emit(&TouchBegan { pos: inside });
        bus.emit(&TouchEnded { pos: inside });
        bus.emit(&TouchBegan { pos: inside });
        bus.emit(&TouchMoved { pos: outside });
        bus.emit(&TouchEnded { pos: outside });

        assert_eq!(
            *log.borrow(),
            vec![
                "agree:touch_began",
                "UI:sound",
                "agree:touch_ended",
                "agree:touch_began",
                "UI:sound",
                "agree:moved_out",
                "agree:canceled",
            ]
        );
    }

    #[test]
    fn test_inactive_canvas_ignores_touch() {
        let bus = EventBus::new();
        let canvas = canvas(&bus);
        canvas.draw(&mut RecordingDrawer::new());
        let log = record(&bus, &["agree:touch_began"]);

        canvas.active(false);
        bus.emit(&TouchBegan {
            pos: Vec2::new(170.0, 80.0),
        });
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_tween_then_signals_after_completion() {
        let bus = EventBus::new();
        let canvas = canvas(&bus);
        let log = record(&bus, &["Title:faded"]);

        canvas.start_tween_then("fade", "Title:faded");
        assert_eq!(canvas.get_widget_param("title", "alpha"), ParamValue::Float(0.0));

        canvas.update(0.25);
        assert!(log.borrow().is_empty());
        canvas.update(0.25);
        assert_eq!(*log.borrow(), vec!["Title:faded"]);
        assert!(!canvas.has_running_tween());
    }

    #[test]
    fn test_set_tween_target() {
        let bus = EventBus::new();
        let canvas = canvas(&bus);
        canvas.set_tween_target("agree", "fade", 0);
        canvas.start_tween("fade");
        assert_eq!(canvas.get_widget_param("agree", "alpha"), ParamValue::Float(0.0));
        assert_eq!(canvas.get_widget_param("title", "alpha"), ParamValue::Float(1.0));

        assert!(matches!(
            canvas.try_set_tween_target("agree", "fade", 3),
            Err(UiError::TweenIndex { len: 1, .. })
        ));
        assert!(matches!(
            canvas.try_set_tween_target("nope", "fade", 0),
            Err(UiError::UnknownWidget(_))
        ));
    }

    #[test]
    fn test_retargeted_tween_keeps_earlier_widget_running() {
        let bus = EventBus::new();
        let canvas = canvas(&bus);

        canvas.set_tween_target("agree", "fade", 0);
        canvas.start_tween("fade");
        canvas.update(0.25);
        canvas.set_tween_target("title", "fade", 0);
        canvas.start_tween("fade");
        assert_eq!(canvas.get_widget_param("title", "alpha"), ParamValue::Float(0.0));

        canvas.update(0.25);
        assert_eq!(canvas.get_widget_param("agree", "alpha"), ParamValue::Float(1.0));
        assert!(canvas.is_tween_running("fade"));

        canvas.update(0.25);
        assert_eq!(canvas.get_widget_param("title", "alpha"), ParamValue::Float(1.0));
        assert!(!canvas.has_running_tween());
    }

    #[test]
    fn test_restart_on_same_widget_replaces_tracks() {
        let bus = EventBus::new();
        let canvas = canvas(&bus);

        canvas.start_tween("fade");
        canvas.update(0.25);
        canvas.start_tween("fade");
        assert_eq!(canvas.get_widget_param("title", "alpha"), ParamValue::Float(0.0));

        canvas.update(0.25);
        assert_eq!(canvas.get_widget_param("title", "alpha"), ParamValue::Float(0.5));
        canvas.update(0.25);
        assert!(!canvas.is_tween_running("fade"));
    }

    #[test]
    fn test_stop_tween_stops_every_target() {
        let bus = EventBus::new();
        let canvas = canvas(&bus);

        canvas.set_tween_target("agree", "fade", 0);
        canvas.start_tween("fade");
        canvas.set_tween_target("title", "fade", 0);
        canvas.start_tween("fade");
        canvas.update(0.25);

        canvas.stop_tween("fade");
        assert!(!canvas.is_tween_running("fade"));
        canvas.update(0.5);
        assert_eq!(canvas.get_widget_param("agree", "alpha"), ParamValue::Float(0.5));
        assert_eq!(canvas.get_widget_param("title", "alpha"), ParamValue::Float(0.5));
    }

    #[test]
    fn test_common_tween_per_widget() {
        let bus = EventBus::new();
        let canvas = canvas(&bus);
        canvas.start_common_tween("agree", "touch-in");
        canvas.update(0.1);
        assert_eq!(
            canvas.get_widget_param("agree", "scale"),
            ParamValue::Vec2(Vec2::splat(0.9))
        );
        assert!(canvas.try_start_common_tween("agree", "missing").is_err());
    }

    #[test]
    fn test_ndc_to_pos() {
        let bus = EventBus::new();
        let canvas = canvas(&bus);
        assert_eq!(canvas.ndc_to_pos(Vec2::new(0.0, 0.0)), Vec2::new(100.0, 50.0));
        assert_eq!(canvas.ndc_to_pos(Vec2::new(-1.0, 1.0)), Vec2::new(0.0, 0.0));
    }

    #[test]
    #[should_panic(expected = "contract violation")]
    fn test_unknown_widget_is_violation() {
        let bus = EventBus::new();
        canvas(&bus).set_widget_text("nope", "x");
    }
}
