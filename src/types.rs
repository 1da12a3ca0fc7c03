// Core data types shared across the fusion pipeline.

/// A LiDAR point: 3-D position plus return intensity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub intensity: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64, intensity: f64) -> Point3 {
        Point3 { x, y, z, intensity }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.intensity.is_finite()
    }
}

/// The class label attached to a vehicle Box2D. Obstacle boxes carry no class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VehicleClass {
    Car,
    Truck,
}

/// Axis-aligned image-space rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Box2D {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub class: Option<VehicleClass>,
    pub id: Option<usize>,
}

impl Box2D {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Box2D {
        Box2D {
            xmin,
            ymin,
            xmax,
            ymax,
            class: None,
            id: None,
        }
    }

    pub fn with_class(mut self, class: VehicleClass) -> Box2D {
        self.class = Some(class);
        self
    }

    pub fn with_id(mut self, id: usize) -> Box2D {
        self.id = Some(id);
        self
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.xmin + self.xmax) / 2.0, (self.ymin + self.ymax) / 2.0)
    }

    pub fn contains(&self, u: f64, v: f64) -> bool {
        u >= self.xmin && u <= self.xmax && v >= self.ymin && v <= self.ymax
    }

    pub fn is_well_formed(&self) -> bool {
        self.xmax > self.xmin && self.ymax > self.ymin
    }
}

/// Oriented 3-D box in LiDAR coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Box3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub heading: f64,
    pub corner_x: f64,
    pub corner_y: f64,
}

impl Box3D {
    /// True when the box satisfies the downstream-rendering sanity gate.
    pub fn is_sane(&self, max_length: f64, max_width: f64, max_height: f64) -> bool {
        self.length > 0.0
            && self.length < max_length
            && self.width > 0.0
            && self.width < max_width
            && self.height > 0.0
            && self.height < max_height
    }
}

/// Per-detection clustering and reconstruction result, shared shape for both
/// vehicle and obstacle rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub box_2d: Box2D,
    pub box_3d: Option<Box3D>,
    pub cluster_indices: Vec<usize>,
    pub cluster_points: Vec<Point3>,
    pub far: bool,
    pub distance_far: f64,
}

impl Detection {
    pub fn empty(box_2d: Box2D) -> Detection {
        Detection {
            box_2d,
            box_3d: None,
            cluster_indices: Vec::new(),
            cluster_points: Vec::new(),
            far: false,
            distance_far: 0.0,
        }
    }
}

/// The output of a single frame's fusion pass.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameResult {
    pub vehicles: Vec<Detection>,
    pub obstacles: Vec<Detection>,
}
