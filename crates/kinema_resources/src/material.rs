use glam::Vec4;

/// Surface description referenced by submeshes through their material index.
///
/// The renderer interprets materials; the actor only stores and names them.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub color: Vec4,
    pub opacity: f32,
    pub double_sided: bool,
}

impl Material {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: Vec4::ONE,
            opacity: 1.0,
            double_sided: false,
        }
    }
}
