//! Engine event hooks the plugin subscribes to

use sprite3d_scene::RenderStage;

/// Engine callback points, with their raw hook codes
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    /// After the GUI is drawn
    PostScreenDraw = 0x4,
    /// Before the room background is drawn; `data` carries the device
    PreScreenDraw = 0x8,
    /// `data` is the save stream handle
    SaveGame = 0x10,
    /// `data` is the restore stream handle
    RestoreGame = 0x20,
    PreGuiDraw = 0x40,
    /// Last chance to draw before the frame is presented
    FinalScreenDraw = 0x800,
    /// Start of a frame, before any drawing
    PreRender = 0x10000,
}

impl HostEvent {
    pub const ALL: [HostEvent; 7] = [
        HostEvent::SaveGame,
        HostEvent::RestoreGame,
        HostEvent::PreRender,
        HostEvent::PreScreenDraw,
        HostEvent::PreGuiDraw,
        HostEvent::PostScreenDraw,
        HostEvent::FinalScreenDraw,
    ];

    pub fn from_raw(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|ev| *ev as i32 == code)
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    /// Stage drawn at this callback point
    pub fn render_stage(self) -> Option<RenderStage> {
        match self {
            HostEvent::PreScreenDraw => Some(RenderStage::Background),
            HostEvent::PreGuiDraw => Some(RenderStage::Scene),
            HostEvent::PostScreenDraw => Some(RenderStage::Gui),
            HostEvent::FinalScreenDraw => Some(RenderStage::Screen),
            _ => None,
        }
    }
}
