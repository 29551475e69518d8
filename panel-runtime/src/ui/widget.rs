//! # Widget 模块
//!
//! UI 树的节点：几何状态、显示/交互开关、一个绘制部件以及有序的子节点。
//!
//! ## 布局
//!
//! 每一层都从父节点**本帧计算出的**矩形推导自己的矩形：
//!
//! 1. 本地矩形按 `offset` 平移
//! 2. `anchor_min/anchor_max` 乘以父尺寸，得到两个锚点
//! 3. 位置 = 左上 + 锚点 min，尺寸 = 右下 + 锚点 max - 位置
//! 4. 以 `pivot` 为中心缩放
//! 5. 平移到父矩形的原点
//!
//! ## 显示开关
//!
//! `enable(false)` 只改自己的标志，同时把「父节点已关闭」递归告诉所有子孙；
//! 子孙自己的标志不变，父节点重新打开后恢复原先的状态。

use serde::Deserialize;
use std::sync::atomic::{AtomicU32, Ordering};

use super::base::{BaseDesc, WidgetBase};
use super::param::{GeometryParam, ParamType, ParamValue};
use super::{Color, Drawer, Rect, Vec2};
use crate::error::UiError;

/// Widget 的声明式描述
///
/// 缺省字段使用默认值：enable/active = true，alpha = 1，scale = (1, 1)，
/// pivot = (0.5, 0.5)，anchor = (0.5, 0.5) - (0.5, 0.5)。
#[derive(Debug, Clone, Deserialize)]
pub struct WidgetDesc {
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default = "default_true")]
    pub enable: bool,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    /// `[anchor_min, anchor_max]`
    #[serde(default)]
    pub anchor: Option<[Vec2; 2]>,
    /// 有安全区域的平台上优先使用
    #[serde(default)]
    pub anchor_safe: Option<[Vec2; 2]>,
    #[serde(default = "Vec2::one")]
    pub scale: Vec2,
    #[serde(default = "default_pivot")]
    pub pivot: Vec2,
    #[serde(default)]
    pub offset: Vec2,
    /// 交互事件名
    #[serde(default)]
    pub event: Option<String>,
    /// 拖动进入时也开始追踪
    #[serde(default)]
    pub move_event: bool,
    /// 触摸时的音效
    #[serde(default)]
    pub se: Option<String>,
    #[serde(default)]
    pub base: BaseDesc,
    #[serde(default)]
    pub children: Vec<WidgetDesc>,
}

impl Default for WidgetDesc {
    fn default() -> Self {
        Self {
            rect: Rect::default(),
            identifier: None,
            enable: true,
            active: true,
            alpha: 1.0,
            anchor: None,
            anchor_safe: None,
            scale: Vec2::one(),
            pivot: default_pivot(),
            offset: Vec2::zero(),
            event: None,
            move_event: false,
            se: None,
            base: BaseDesc::Blank,
            children: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_alpha() -> f32 {
    1.0
}

fn default_pivot() -> Vec2 {
    Vec2::splat(0.5)
}

/// 调试边框配色（黄金角步进，相邻的 Widget 颜色区分明显）
fn next_frame_color() -> Color {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    Color::from_hsv((n as f32 * 0.618_034).fract(), 1.0, 1.0)
}

/// UI 节点
#[derive(Debug)]
pub struct Widget {
    identifier: Option<String>,
    enable: bool,
    /// 祖先全部处于显示状态
    parent_enable: bool,
    active: bool,

    rect: Rect,
    offset: Vec2,
    /// 缩放中心（归一化）
    pivot: Vec2,
    /// 父尺寸的影响（归一化）
    anchor_min: Vec2,
    anchor_max: Vec2,
    scale: Vec2,
    alpha: f32,

    event: Option<String>,
    move_event: bool,
    se: Option<String>,

    base: Box<dyn WidgetBase>,
    children: Vec<Widget>,

    /// 最近一次绘制时的画面矩形
    disp_rect: Rect,
    frame_color: Color,
}

impl Widget {
    /// 以本地矩形和绘制部件创建
    pub fn new(rect: Rect, base: Box<dyn WidgetBase>) -> Self {
        Self {
            identifier: None,
            enable: true,
            parent_enable: true,
            active: true,
            rect,
            offset: Vec2::zero(),
            pivot: default_pivot(),
            anchor_min: Vec2::splat(0.5),
            anchor_max: Vec2::splat(0.5),
            scale: Vec2::one(),
            alpha: 1.0,
            event: None,
            move_event: false,
            se: None,
            base,
            children: Vec::new(),
            disp_rect: Rect::default(),
            frame_color: next_frame_color(),
        }
    }

    /// 从描述创建（递归创建子节点）
    pub fn from_desc(desc: &WidgetDesc, safe_area: bool) -> Self {
        let mut widget = Self::new(desc.rect, desc.base.build());

        widget.identifier = desc.identifier.clone();
        widget.enable = desc.enable;
        widget.active = desc.active;
        widget.alpha = desc.alpha;

        let anchor = match (safe_area, desc.anchor_safe, desc.anchor) {
            (true, Some(anchor), _) => Some(anchor),
            (_, _, anchor) => anchor,
        };
        if let Some([min, max]) = anchor {
            widget.anchor_min = min;
            widget.anchor_max = max;
        }

        widget.scale = desc.scale;
        widget.pivot = desc.pivot;
        widget.offset = desc.offset;
        widget.event = desc.event.clone();
        widget.move_event = desc.move_event;
        widget.se = desc.se.clone();

        widget.children = desc
            .children
            .iter()
            .map(|child| Self::from_desc(child, safe_area))
            .collect();
        widget
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// 交互事件名
    pub fn event(&self) -> Option<&str> {
        self.event.as_deref()
    }

    /// 当前是否处理交互事件
    pub fn has_event(&self) -> bool {
        self.event.is_some() && self.active
    }

    /// 拖动进入时是否也开始追踪
    pub fn react_move_event(&self) -> bool {
        self.event.is_some() && self.move_event
    }

    /// 触摸音效
    pub fn se(&self) -> Option<&str> {
        self.se.as_deref()
    }

    pub fn set_se(&mut self, se: impl Into<String>) {
        self.se = Some(se.into());
    }

    pub fn children(&self) -> &[Widget] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Widget] {
        &mut self.children
    }

    pub fn add_child(&mut self, mut child: Widget) {
        child.set_parent_enable(self.is_effective_enable());
        self.children.push(child);
    }

    pub fn base(&self) -> &dyn WidgetBase {
        self.base.as_ref()
    }

    /// 命中判定（以最近一次绘制的矩形为准）
    pub fn contains(&self, point: Vec2) -> bool {
        self.is_effective_enable() && self.active && self.disp_rect.contains(point)
    }

    /// 显示开关，影响所有子孙
    pub fn enable(&mut self, enable: bool) {
        self.enable = enable;
        let effective = self.is_effective_enable();
        for child in &mut self.children {
            child.set_parent_enable(effective);
        }
    }

    fn set_parent_enable(&mut self, enable: bool) {
        self.parent_enable = enable;
        let effective = self.is_effective_enable();
        for child in &mut self.children {
            child.set_parent_enable(effective);
        }
    }

    /// 自己的显示标志
    pub fn is_enable(&self) -> bool {
        self.enable
    }

    /// 实际是否显示（自己与所有祖先都打开）
    pub fn is_effective_enable(&self) -> bool {
        self.enable && self.parent_enable
    }

    /// 是否处理交互事件（与显示无关）
    pub fn active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 设置参数：几何参数由自己处理，其余交给绘制部件
    pub fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), UiError> {
        match name.parse::<GeometryParam>() {
            Ok(param) => self.set_geometry(param, value),
            Err(()) => self.base.set_param(name, value),
        }
    }

    /// 读取参数（副本）
    pub fn get_param(&self, name: &str) -> Result<ParamValue, UiError> {
        match name.parse::<GeometryParam>() {
            Ok(param) => Ok(self.geometry(param)),
            Err(()) => self.base.get_param(name),
        }
    }

    /// 读出、修改、写回
    pub fn modify_param<F>(&mut self, name: &str, f: F) -> Result<(), UiError>
    where
        F: FnOnce(&mut ParamValue),
    {
        let mut value = self.get_param(name)?;
        f(&mut value);
        self.set_param(name, value)
    }

    /// 设置几何参数
    pub fn set_geometry(&mut self, param: GeometryParam, value: ParamValue) -> Result<(), UiError> {
        let name = param.name();
        match param {
            GeometryParam::Rect => self.rect = Rect::expect(name, &value)?,
            GeometryParam::Pivot => self.pivot = Vec2::expect(name, &value)?,
            GeometryParam::AnchorMin => self.anchor_min = Vec2::expect(name, &value)?,
            GeometryParam::AnchorMax => self.anchor_max = Vec2::expect(name, &value)?,
            GeometryParam::Offset => self.offset = Vec2::expect(name, &value)?,
            GeometryParam::Scale => self.scale = Vec2::expect(name, &value)?,
            GeometryParam::Alpha => self.alpha = f32::expect(name, &value)?,
        }
        Ok(())
    }

    /// 读取几何参数
    pub fn geometry(&self, param: GeometryParam) -> ParamValue {
        match param {
            GeometryParam::Rect => self.rect.into(),
            GeometryParam::Pivot => self.pivot.into(),
            GeometryParam::AnchorMin => self.anchor_min.into(),
            GeometryParam::AnchorMax => self.anchor_max.into(),
            GeometryParam::Offset => self.offset.into(),
            GeometryParam::Scale => self.scale.into(),
            GeometryParam::Alpha => self.alpha.into(),
        }
    }

    /// 由父矩形计算自己的画面矩形（纯函数）
    pub fn calc_rect(&self, parent_rect: Rect) -> Rect {
        let rect = self.rect.offset(self.offset);

        let parent_size = parent_rect.size();
        let anchor_min = parent_size * self.anchor_min;
        let anchor_max = parent_size * self.anchor_max;

        let mut pos = rect.upper_left() + anchor_min;
        let mut size = rect.lower_right() + anchor_max - pos;

        let d = size * self.pivot;
        pos -= d * self.scale - d;
        size *= self.scale;

        let parent_pos = parent_rect.upper_left();
        Rect::from_corners(pos + parent_pos, pos + size + parent_pos)
    }

    /// 最近一次绘制的画面矩形
    pub fn disp_rect(&self) -> Rect {
        self.disp_rect
    }

    /// 绘制自己和子孙
    pub fn draw(&mut self, parent_rect: Rect, drawer: &mut dyn Drawer, parent_alpha: f32) {
        if !self.is_effective_enable() {
            return;
        }

        let alpha = parent_alpha * self.alpha;
        self.disp_rect = self.calc_rect(parent_rect);
        self.base.draw(self.disp_rect, drawer, alpha);

        let rect = self.disp_rect;
        for child in &mut self.children {
            child.draw(rect, drawer, alpha);
        }
    }

    /// 调试边框
    pub fn debug_draw(&self, drawer: &mut dyn Drawer) {
        if !self.is_effective_enable() {
            return;
        }
        drawer.stroke_rect(self.disp_rect, self.frame_color);
        for child in &self.children {
            child.debug_draw(drawer);
        }
    }

    /// 声明为不显示的子树，向下传播关闭状态
    ///
    /// 保证这些分支在第一次绘制前就是关闭的。
    pub fn check_inactive(&mut self) {
        if !self.enable {
            self.enable(false);
        }
        for child in &mut self.children {
            child.check_inactive();
        }
    }

    /// 按子节点索引路径取子孙（空路径为自己）
    pub fn descendant(&self, path: &[usize]) -> Option<&Widget> {
        path.iter().try_fold(self, |w, &i| w.children.get(i))
    }

    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut Widget> {
        path.iter().try_fold(self, |w, &i| w.children.get_mut(i))
    }

    /// 调试边框颜色
    pub fn frame_color(&self) -> Color {
        self.frame_color
    }

    /// 深度优先遍历（含自己）
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a Widget)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::base::Blank;

    fn blank(rect: Rect) -> Widget {
        Widget::new(rect, Box::new(Blank))
    }

    fn draw_root(root: &mut Widget) {
        let mut drawer = crate::ui::RecordingDrawer::new();
        root.draw(Rect::new(0.0, 0.0, 100.0, 100.0), &mut drawer, 1.0);
    }

    #[test]
    fn test_calc_rect_centered() {
        // 默认锚点在父中心
        let w = blank(Rect::new(-10.0, -5.0, 10.0, 5.0));
        let r = w.calc_rect(Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(r, Rect::new(40.0, 20.0, 60.0, 30.0));
    }

    #[test]
    fn test_calc_rect_stretch_with_pivot_scale() {
        let mut w = blank(Rect::new(10.0, 10.0, -10.0, -10.0));
        w.set_param("anchor_min", Vec2::new(0.0, 0.0).into()).unwrap();
        w.set_param("anchor_max", Vec2::new(1.0, 1.0).into()).unwrap();
        w.set_param("scale", Vec2::splat(0.5).into()).unwrap();

        // 拉伸到 (10,10)-(90,90)，再以中心缩小一半
        let r = w.calc_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(r, Rect::new(30.0, 30.0, 70.0, 70.0));

        // 同样的输入得到同样的结果
        assert_eq!(w.calc_rect(Rect::new(0.0, 0.0, 100.0, 100.0)), r);
    }

    #[test]
    fn test_nested_uses_computed_parent_rect() {
        let mut parent = blank(Rect::new(0.0, 0.0, 0.0, 0.0));
        parent.set_param("anchor_min", Vec2::zero().into()).unwrap();
        parent.set_param("anchor_max", Vec2::one().into()).unwrap();
        parent.set_param("offset", Vec2::new(10.0, 0.0).into()).unwrap();

        let mut child = blank(Rect::new(0.0, 0.0, 10.0, 10.0));
        child.set_param("anchor_min", Vec2::zero().into()).unwrap();
        child.set_param("anchor_max", Vec2::zero().into()).unwrap();
        parent.add_child(child);

        draw_root(&mut parent);
        assert_eq!(parent.disp_rect(), Rect::new(10.0, 0.0, 110.0, 100.0));
        assert_eq!(parent.children()[0].disp_rect(), Rect::new(10.0, 0.0, 20.0, 10.0));
    }

    #[test]
    fn test_enable_propagates_without_touching_own_flags() {
        let mut root = blank(Rect::new(-50.0, -50.0, 50.0, 50.0));
        let mut mid = blank(Rect::new(-50.0, -50.0, 50.0, 50.0));
        let mut hidden = blank(Rect::new(-50.0, -50.0, 50.0, 50.0));
        hidden.enable(false);
        mid.add_child(blank(Rect::new(-50.0, -50.0, 50.0, 50.0)));
        mid.add_child(hidden);
        root.add_child(mid);

        draw_root(&mut root);
        let center = Vec2::new(50.0, 50.0);
        assert!(root.children()[0].children()[0].contains(center));

        root.enable(false);
        root.visit(&mut |w| assert!(!w.contains(center)));
        let mid = &root.children()[0];
        assert!(mid.is_enable());
        assert!(mid.children()[0].is_enable());
        assert!(!mid.children()[1].is_enable());

        root.enable(true);
        let mid = &root.children()[0];
        assert!(mid.is_effective_enable());
        assert!(mid.children()[0].is_effective_enable());
        assert!(!mid.children()[1].is_effective_enable());
    }

    #[test]
    fn test_contains_requires_active() {
        let mut w = blank(Rect::new(-10.0, -10.0, 10.0, 10.0));
        draw_root(&mut w);
        assert!(w.contains(Vec2::new(50.0, 50.0)));
        w.active(false);
        assert!(!w.contains(Vec2::new(50.0, 50.0)));
    }

    #[test]
    fn test_param_dispatch() {
        let desc: WidgetDesc = serde_json::from_str(
            r#"{ "rect": [0, 0, 10, 10], "base": { "type": "text", "text": "0'00" } }"#,
        )
        .unwrap();
        let mut w = Widget::from_desc(&desc, false);

        assert_eq!(w.get_param("alpha"), Ok(ParamValue::Float(1.0)));
        assert_eq!(w.get_param("text"), Ok(ParamValue::Text("0'00".into())));
        w.set_param("text", "1'30".into()).unwrap();
        assert_eq!(w.get_param("text"), Ok(ParamValue::Text("1'30".into())));

        assert!(matches!(
            w.set_param("offset", ParamValue::Float(0.0)),
            Err(UiError::ParamType { .. })
        ));
        assert!(matches!(
            w.set_param("image", "x".into()),
            Err(UiError::UnknownParam { .. })
        ));
    }

    #[test]
    fn test_modify_param_writes_back() {
        let mut w = blank(Rect::new(0.0, 0.0, 10.0, 10.0));
        w.set_param("offset", Vec2::new(3.0, 4.0).into()).unwrap();
        w.modify_param("offset", |v| {
            if let ParamValue::Vec2(offset) = v {
                offset.x = -offset.x;
            }
        })
        .unwrap();
        assert_eq!(w.get_param("offset"), Ok(ParamValue::Vec2(Vec2::new(-3.0, 4.0))));
    }

    #[test]
    fn test_safe_area_anchor_preferred() {
        let desc: WidgetDesc = serde_json::from_str(
            r#"{ "anchor": [[0, 0], [0, 0]], "anchor_safe": [[1, 1], [1, 1]] }"#,
        )
        .unwrap();
        let normal = Widget::from_desc(&desc, false);
        let safe = Widget::from_desc(&desc, true);
        assert_eq!(normal.get_param("anchor_min"), Ok(ParamValue::Vec2(Vec2::zero())));
        assert_eq!(safe.get_param("anchor_min"), Ok(ParamValue::Vec2(Vec2::one())));
    }

    #[test]
    fn test_check_inactive_cascades() {
        let desc: WidgetDesc = serde_json::from_str(
            r#"{ "children": [ { "enable": false, "children": [ {} ] } ] }"#,
        )
        .unwrap();
        let mut root = Widget::from_desc(&desc, false);
        assert!(root.children()[0].children()[0].is_effective_enable());

        root.check_inactive();
        assert!(!root.children()[0].children()[0].is_effective_enable());
        assert!(root.children()[0].children()[0].is_enable());
    }
}
