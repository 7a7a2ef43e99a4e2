use lively_api::{Game_Api, State_Descriptor};
use std::fmt;

/// Where the code of a module lives.
pub enum Module_Image {
    /// Linked into this binary (release/web), or in-process code used by tests.
    Static,
    #[cfg(feature = "hot-reload")]
    Dynamic(crate::hotload::Loaded_Library),
}

/// The active game module: its code image, its entry points and the state layout it was
/// compiled with. Replaced as a whole on every reload.
pub struct Module_Handle {
    pub api: Game_Api,
    /// Descriptor the module reported when queried without a state.
    pub descriptor: State_Descriptor,
    /// 0 for the first module, +1 on every successful swap.
    pub generation: u32,
    // Must outlive `api`: declared last so the image is closed after everything else.
    image: Module_Image,
}

impl Module_Handle {
    pub fn new_static(api: Game_Api) -> Self {
        Self::new(api, Module_Image::Static, 0)
    }

    pub fn new(api: Game_Api, image: Module_Image, generation: u32) -> Self {
        Module_Handle {
            descriptor: api.compiled_descriptor(),
            api,
            generation,
            image,
        }
    }

    pub fn with_generation(mut self, generation: u32) -> Self {
        self.generation = generation;
        self
    }

    pub fn image(&self) -> &Module_Image {
        &self.image
    }

    pub fn is_dynamic(&self) -> bool {
        !matches!(self.image, Module_Image::Static)
    }
}

impl fmt::Debug for Module_Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = f.debug_struct("Module_Handle");
        s.field("generation", &self.generation)
            .field("descriptor", &self.descriptor);
        match &self.image {
            Module_Image::Static => s.field("image", &"static"),
            #[cfg(feature = "hot-reload")]
            Module_Image::Dynamic(lib) => s.field("image", &lib.unique_path()),
        };
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lively_test::fake_modules::{v1, v2};

    #[test]
    fn static_module_reports_its_descriptor() {
        let m = Module_Handle::new_static(v1::api());
        assert_eq!(m.descriptor, State_Descriptor::new(1, 128));
        assert_eq!(m.generation, 0);
        assert!(!m.is_dynamic());

        let m = Module_Handle::new_static(v2::api()).with_generation(3);
        assert_eq!(m.descriptor, State_Descriptor::new(2, 256));
        assert_eq!(m.generation, 3);
    }
}
