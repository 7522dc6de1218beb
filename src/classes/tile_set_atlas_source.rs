//! `TileSetAtlasSource`: tiles cut from a single atlas texture.

use std::sync::{Arc, OnceLock};

use enginebridge_core::{CallError, Rect2i, StringName, Variant, Vector2i};

use super::resource::{Resource, ResourceVirtual};
use crate::marshal::{ptrcall_0, ptrcall_1, ptrcall_2};
use crate::object::engine_class;
use crate::script::DispatchVirtual;
use crate::{Bridge, EngineClass, NameTable};

pub mod property_name {
    pub const TEXTURE_REGION_SIZE: &str = "texture_region_size";
    pub const MARGINS: &str = "margins";
    pub const SEPARATION: &str = "separation";
}

pub mod method_name {
    pub const SET_TEXTURE_REGION_SIZE: &str = "set_texture_region_size";
    pub const GET_TEXTURE_REGION_SIZE: &str = "get_texture_region_size";
    pub const SET_MARGINS: &str = "set_margins";
    pub const GET_MARGINS: &str = "get_margins";
    pub const SET_SEPARATION: &str = "set_separation";
    pub const GET_SEPARATION: &str = "get_separation";
    pub const CREATE_TILE: &str = "create_tile";
    pub const REMOVE_TILE: &str = "remove_tile";
    pub const HAS_TILE: &str = "has_tile";
    pub const GET_TILES_COUNT: &str = "get_tiles_count";
    pub const GET_TILE_ID: &str = "get_tile_id";
    pub const GET_TILE_SIZE_IN_ATLAS: &str = "get_tile_size_in_atlas";
    pub const GET_TILE_TEXTURE_REGION: &str = "get_tile_texture_region";
}

pub mod keys {
    use enginebridge_core::VariantType as V;

    use crate::MethodKey;

    const CLASS: &str = "TileSetAtlasSource";

    pub const SET_TEXTURE_REGION_SIZE: MethodKey =
        MethodKey::new(CLASS, "set_texture_region_size", &[V::Vector2i], None);
    pub const GET_TEXTURE_REGION_SIZE: MethodKey =
        MethodKey::new(CLASS, "get_texture_region_size", &[], Some(V::Vector2i));
    pub const SET_MARGINS: MethodKey = MethodKey::new(CLASS, "set_margins", &[V::Vector2i], None);
    pub const GET_MARGINS: MethodKey = MethodKey::new(CLASS, "get_margins", &[], Some(V::Vector2i));
    pub const SET_SEPARATION: MethodKey = MethodKey::new(CLASS, "set_separation", &[V::Vector2i], None);
    pub const GET_SEPARATION: MethodKey = MethodKey::new(CLASS, "get_separation", &[], Some(V::Vector2i));
    pub const CREATE_TILE: MethodKey = MethodKey::new(CLASS, "create_tile", &[V::Vector2i, V::Vector2i], None);
    pub const REMOVE_TILE: MethodKey = MethodKey::new(CLASS, "remove_tile", &[V::Vector2i], None);
    pub const HAS_TILE: MethodKey = MethodKey::new(CLASS, "has_tile", &[V::Vector2i], Some(V::Bool));
    pub const GET_TILES_COUNT: MethodKey = MethodKey::new(CLASS, "get_tiles_count", &[], Some(V::Int));
    pub const GET_TILE_ID: MethodKey = MethodKey::new(CLASS, "get_tile_id", &[V::Int], Some(V::Vector2i));
    pub const GET_TILE_SIZE_IN_ATLAS: MethodKey =
        MethodKey::new(CLASS, "get_tile_size_in_atlas", &[V::Vector2i], Some(V::Vector2i));
    pub const GET_TILE_TEXTURE_REGION: MethodKey =
        MethodKey::new(CLASS, "get_tile_texture_region", &[V::Vector2i, V::Int], Some(V::Rect2i));

    pub const ALL: &[MethodKey] = &[
        SET_TEXTURE_REGION_SIZE,
        GET_TEXTURE_REGION_SIZE,
        SET_MARGINS,
        GET_MARGINS,
        SET_SEPARATION,
        GET_SEPARATION,
        CREATE_TILE,
        REMOVE_TILE,
        HAS_TILE,
        GET_TILES_COUNT,
        GET_TILE_ID,
        GET_TILE_SIZE_IN_ATLAS,
        GET_TILE_TEXTURE_REGION,
    ];
}

pub fn names() -> &'static NameTable {
    static TABLE: OnceLock<NameTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let methods: Vec<&str> = keys::ALL.iter().map(|key| key.method).collect();
        NameTable::new("TileSetAtlasSource", Some(super::resource::names()))
            .with_properties(&[
                property_name::TEXTURE_REGION_SIZE,
                property_name::MARGINS,
                property_name::SEPARATION,
            ])
            .with_methods(&methods)
    })
}

engine_class! {
    /// A tile source laid out as a grid over one texture. Tiles are
    /// addressed by their atlas coordinates.
    TileSetAtlasSource: Resource
}

impl TileSetAtlasSource {
    pub fn new(bridge: &Arc<Bridge>) -> Self {
        bridge.construct()
    }

    /// Size in pixels of one grid cell.
    pub fn set_texture_region_size(&self, size: Vector2i) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::SET_TEXTURE_REGION_SIZE), raw.instance(), &size)
    }

    pub fn get_texture_region_size(&self) -> Vector2i {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_TEXTURE_REGION_SIZE), raw.instance())
    }

    pub fn set_margins(&self, margins: Vector2i) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::SET_MARGINS), raw.instance(), &margins)
    }

    pub fn get_margins(&self) -> Vector2i {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_MARGINS), raw.instance())
    }

    pub fn set_separation(&self, separation: Vector2i) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::SET_SEPARATION), raw.instance(), &separation)
    }

    pub fn get_separation(&self) -> Vector2i {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_SEPARATION), raw.instance())
    }

    /// Create a tile at `atlas_coords` covering `size` cells. `size`
    /// defaults to one cell.
    pub fn create_tile(&self, atlas_coords: Vector2i, size: Option<Vector2i>) {
        let size = size.unwrap_or(Vector2i::ONE);
        let raw = self.raw();
        ptrcall_2(raw.bridge(), raw.bind(&keys::CREATE_TILE), raw.instance(), &atlas_coords, &size)
    }

    pub fn remove_tile(&self, atlas_coords: Vector2i) {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::REMOVE_TILE), raw.instance(), &atlas_coords)
    }

    pub fn has_tile(&self, atlas_coords: Vector2i) -> bool {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::HAS_TILE), raw.instance(), &atlas_coords)
    }

    pub fn get_tiles_count(&self) -> i32 {
        let raw = self.raw();
        ptrcall_0(raw.bridge(), raw.bind(&keys::GET_TILES_COUNT), raw.instance())
    }

    /// Atlas coordinates of the tile at `index`.
    pub fn get_tile_id(&self, index: i32) -> Vector2i {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::GET_TILE_ID), raw.instance(), &index)
    }

    pub fn get_tile_size_in_atlas(&self, atlas_coords: Vector2i) -> Vector2i {
        let raw = self.raw();
        ptrcall_1(raw.bridge(), raw.bind(&keys::GET_TILE_SIZE_IN_ATLAS), raw.instance(), &atlas_coords)
    }

    /// Pixel region of an animation frame of a tile. `frame` defaults to `0`.
    pub fn get_tile_texture_region(&self, atlas_coords: Vector2i, frame: Option<i32>) -> Rect2i {
        let frame = frame.unwrap_or(0);
        let raw = self.raw();
        ptrcall_2(
            raw.bridge(),
            raw.bind(&keys::GET_TILE_TEXTURE_REGION),
            raw.instance(),
            &atlas_coords,
            &frame,
        )
    }
}

impl<T: ResourceVirtual> DispatchVirtual<T> for TileSetAtlasSource {
    fn is_virtual(method: &str) -> bool {
        <Resource as DispatchVirtual<T>>::is_virtual(method)
    }

    fn invoke_virtual(
        this: &mut T,
        overrides: &[&str],
        method: &StringName,
        args: &[Variant],
    ) -> Result<Option<Variant>, CallError> {
        <Resource as DispatchVirtual<T>>::invoke_virtual(this, overrides, method, args)
    }
}
