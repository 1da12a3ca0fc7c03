// Occlusion graph: the containment predicate, the vehicle/obstacle table,
// and the connected-components grouping over the vehicle sub-table.

use crate::types::Box2D;

/// Containment predicate used for both vehicle-vehicle and obstacle-vehicle
/// entries. Asymmetric in `b`, the candidate occludee.
pub fn occluded(a: &Box2D, b: &Box2D, iou_threshold: f64) -> bool {
    let (cx_a, cy_a) = a.center();
    let (cx_b, cy_b) = b.center();
    let dx = (cx_a - cx_b).abs();
    let dy = (cy_a - cy_b).abs();
    let lx = (a.width() + b.width()) / 2.0 - dx;
    let ly = (a.height() + b.height()) / 2.0 - dy;
    lx > iou_threshold * b.width() && ly > iou_threshold * b.height()
}

/// A matrix of pairwise occlusion flags. Rows 0..num_vehicles encode the
/// strictly-upper vehicle-vehicle table; rows num_vehicles..num_vehicles+num_obstacles
/// encode the obstacle-vehicle block (one column per vehicle).
#[derive(Clone, Debug)]
pub struct OcclusionTable {
    num_vehicles: usize,
    num_obstacles: usize,
    /// `vehicle_vehicle[i][j]` is valid for `j > i`, both `< num_vehicles`.
    vehicle_vehicle: Vec<Vec<bool>>,
    /// `obstacle_vehicle[o][v]` for `o < num_obstacles`, `v < num_vehicles`.
    obstacle_vehicle: Vec<Vec<bool>>,
}

impl OcclusionTable {
    pub fn build(vehicle_boxes: &[Box2D], obstacle_boxes: &[Box2D], iou_threshold: f64) -> OcclusionTable {
        let num_vehicles = vehicle_boxes.len();
        let num_obstacles = obstacle_boxes.len();

        let mut vehicle_vehicle = vec![vec![false; num_vehicles]; num_vehicles];
        for i in 0..num_vehicles {
            for j in (i + 1)..num_vehicles {
                vehicle_vehicle[i][j] = occluded(&vehicle_boxes[i], &vehicle_boxes[j], iou_threshold);
            }
        }

        let mut obstacle_vehicle = vec![vec![false; num_vehicles]; num_obstacles];
        for o in 0..num_obstacles {
            for v in 0..num_vehicles {
                obstacle_vehicle[o][v] = occluded(&obstacle_boxes[o], &vehicle_boxes[v], iou_threshold);
            }
        }

        OcclusionTable {
            num_vehicles,
            num_obstacles,
            vehicle_vehicle,
            obstacle_vehicle,
        }
    }

    pub fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }

    pub fn num_obstacles(&self) -> usize {
        self.num_obstacles
    }

    /// True iff vehicle `i` occludes vehicle `j` (requires `j > i`).
    pub fn vehicle_occludes(&self, i: usize, j: usize) -> bool {
        debug_assert!(j > i);
        self.vehicle_vehicle[i][j]
    }

    /// True iff obstacle `o` occludes vehicle `v`.
    pub fn obstacle_occludes(&self, o: usize, v: usize) -> bool {
        self.obstacle_vehicle[o][v]
    }

    /// True iff obstacle `o` occludes at least one vehicle.
    pub fn obstacle_is_relevant(&self, o: usize) -> bool {
        self.obstacle_vehicle[o].iter().any(|&flag| flag)
    }

    /// Partitions `0..num_vehicles` into connected components of the
    /// vehicle-vehicle occlusion graph, traversed in the order given by
    /// `seed_order` (the caller sorts by descending `ymax` before calling).
    /// Each group's members are sorted ascending; group order is discovery order.
    pub fn groups(&self, seed_order: &[usize]) -> Vec<Vec<usize>> {
        let mut visited = vec![false; self.num_vehicles];
        let mut groups = Vec::new();

        for &seed in seed_order {
            if visited[seed] {
                continue;
            }
            let mut members = Vec::new();
            let mut stack = vec![seed];
            visited[seed] = true;
            while let Some(i) = stack.pop() {
                members.push(i);
                for j in (i + 1)..self.num_vehicles {
                    if !visited[j] && self.vehicle_occludes(i, j) {
                        visited[j] = true;
                        stack.push(j);
                    }
                }
            }
            members.sort_unstable();
            groups.push(members);
        }

        groups
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::Box2D;

    #[test]
    fn test_occluded_is_reflexive() {
        let a = Box2D::new(0.0, 0.0, 10.0, 10.0);
        assert!(occluded(&a, &a, 0.25));
    }

    #[test]
    fn test_occluded_false_for_disjoint_boxes() {
        let a = Box2D::new(0.0, 0.0, 10.0, 10.0);
        let b = Box2D::new(100.0, 100.0, 110.0, 110.0);
        assert!(!occluded(&a, &b, 0.25));
    }

    #[test]
    fn test_two_disjoint_vehicles_form_two_groups() {
        let vehicles = vec![
            Box2D::new(0.0, 0.0, 10.0, 10.0),
            Box2D::new(100.0, 0.0, 110.0, 10.0),
        ];
        let table = OcclusionTable::build(&vehicles, &[], 0.25);
        let groups = table.groups(&[0, 1]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], vec![0]);
        assert_eq!(groups[1], vec![1]);
    }

    #[test]
    fn test_overlapping_vehicles_form_one_group() {
        let vehicles = vec![
            Box2D::new(0.0, 0.0, 10.0, 10.0),
            Box2D::new(1.0, 1.0, 9.0, 9.0),
        ];
        let table = OcclusionTable::build(&vehicles, &[], 0.25);
        let groups = table.groups(&[0, 1]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0], vec![0, 1]);
    }

    #[test]
    fn test_obstacle_relevance() {
        let vehicles = vec![Box2D::new(0.0, 0.0, 10.0, 10.0)];
        let obstacles = vec![
            Box2D::new(1.0, 1.0, 9.0, 9.0),
            Box2D::new(1000.0, 1000.0, 1010.0, 1010.0),
        ];
        let table = OcclusionTable::build(&vehicles, &obstacles, 0.25);
        assert!(table.obstacle_is_relevant(0));
        assert!(!table.obstacle_is_relevant(1));
    }
}
