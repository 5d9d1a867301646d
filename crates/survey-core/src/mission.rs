//! Mission item serialization in the QGroundControl plan file format
//!
//! A mission is one camera-trigger-distance command followed by a waypoint for
//! every point of every leg, in leg order. Item ids (`doJumpId`) start at 1 for
//! each mission built; nothing is shared between calls.

use serde::{Deserialize, Serialize};

use crate::Leg;
use crate::error::CoreResult;
use crate::geo::GeoPoint;

/// MAV_CMD_NAV_WAYPOINT
pub const CMD_NAV_WAYPOINT: u16 = 16;
/// MAV_CMD_DO_SET_CAM_TRIGG_DIST
pub const CMD_DO_SET_CAM_TRIGG_DIST: u16 = 206;

/// MAV_FRAME_MISSION, used by commands without a position
pub const FRAME_MISSION: u8 = 2;
/// MAV_FRAME_GLOBAL_RELATIVE_ALT
pub const FRAME_GLOBAL_RELATIVE_ALT: u8 = 3;

/// MAV_AUTOPILOT_PX4
pub const FIRMWARE_PX4: u8 = 12;
/// MAV_TYPE_QUADROTOR
pub const VEHICLE_MULTIROTOR: u8 = 2;

/// QGroundControl altitude mode: relative to home
const ALTITUDE_MODE_RELATIVE: u8 = 1;

const PLAN_FILE_TYPE: &str = "Plan";
const PLAN_FILE_VERSION: u8 = 1;
const GROUND_STATION: &str = "QGroundControl";
const MISSION_VERSION: u8 = 2;
const GEOFENCE_VERSION: u8 = 2;
const RALLY_POINTS_VERSION: u8 = 2;
const SIMPLE_ITEM: &str = "SimpleItem";

/// Per-call source of `doJumpId` values
#[derive(Debug)]
struct JumpIds {
    next: u32,
}

impl JumpIds {
    fn new() -> Self {
        Self { next: 1 }
    }

    fn take(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// One mission instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionItem {
    #[serde(rename = "Altitude", default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(rename = "AltitudeMode", default, skip_serializing_if = "Option::is_none")]
    pub altitude_mode: Option<u8>,
    pub auto_continue: bool,
    pub command: u16,
    pub do_jump_id: u32,
    pub frame: u8,
    pub params: [f64; 7],
    #[serde(rename = "type")]
    pub item_type: String,
}

impl MissionItem {
    fn trigger_distance(do_jump_id: u32, trigger_distance_m: f64) -> Self {
        Self {
            altitude: None,
            altitude_mode: None,
            auto_continue: true,
            command: CMD_DO_SET_CAM_TRIGG_DIST,
            do_jump_id,
            frame: FRAME_MISSION,
            params: [trigger_distance_m, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            item_type: SIMPLE_ITEM.to_string(),
        }
    }

    fn waypoint(do_jump_id: u32, point: &GeoPoint, relative_altitude_m: f64) -> Self {
        Self {
            altitude: Some(relative_altitude_m),
            altitude_mode: Some(ALTITUDE_MODE_RELATIVE),
            auto_continue: true,
            command: CMD_NAV_WAYPOINT,
            do_jump_id,
            frame: FRAME_GLOBAL_RELATIVE_ALT,
            params: [
                0.0,
                0.0,
                0.0,
                0.0,
                point.latitude,
                point.longitude,
                relative_altitude_m,
            ],
            item_type: SIMPLE_ITEM.to_string(),
        }
    }

    pub fn is_waypoint(&self) -> bool {
        self.command == CMD_NAV_WAYPOINT
    }
}

/// Inputs for building a mission from legs
#[derive(Debug, Clone, PartialEq)]
pub struct MissionOptions {
    pub home: GeoPoint,
    /// Altitude above home in meters
    pub relative_altitude_m: f64,
    /// Cruise speed in m/s
    pub speed_mps: f64,
    /// Distance between photo triggers in meters
    pub trigger_distance_m: f64,
    /// MAV_AUTOPILOT value, PX4 when unset
    pub firmware_type: Option<u8>,
    /// MAV_TYPE value, multirotor when unset
    pub vehicle_type: Option<u8>,
}

/// The `mission` object of a plan file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionPlan {
    pub cruise_speed: f64,
    pub firmware_type: u8,
    pub hover_speed: f64,
    pub items: Vec<MissionItem>,
    /// [latitude, longitude, altitude]
    pub planned_home_position: [f64; 3],
    pub vehicle_type: u8,
    pub version: u8,
}

impl MissionPlan {
    /// Trigger command first, then one waypoint per leg point in leg order
    ///
    /// Points shared by consecutive legs are emitted once per leg; nothing is
    /// deduplicated.
    pub fn from_legs(legs: &[Leg], options: &MissionOptions) -> Self {
        let mut ids = JumpIds::new();
        let waypoint_count: usize = legs.iter().map(|l| l.points().len()).sum();

        let mut items = Vec::with_capacity(waypoint_count + 1);
        items.push(MissionItem::trigger_distance(
            ids.take(),
            options.trigger_distance_m,
        ));
        for point in legs.iter().flat_map(|l| l.points()) {
            items.push(MissionItem::waypoint(
                ids.take(),
                point,
                options.relative_altitude_m,
            ));
        }

        Self {
            cruise_speed: options.speed_mps,
            firmware_type: options.firmware_type.unwrap_or(FIRMWARE_PX4),
            hover_speed: options.speed_mps,
            items,
            planned_home_position: [options.home.latitude, options.home.longitude, 0.0],
            vehicle_type: options.vehicle_type.unwrap_or(VEHICLE_MULTIROTOR),
            version: MISSION_VERSION,
        }
    }

    pub fn waypoint_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_waypoint()).count()
    }
}

/// Empty geofence section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFence {
    pub circles: Vec<serde_json::Value>,
    pub polygons: Vec<serde_json::Value>,
    pub version: u8,
}

impl Default for GeoFence {
    fn default() -> Self {
        Self {
            circles: Vec::new(),
            polygons: Vec::new(),
            version: GEOFENCE_VERSION,
        }
    }
}

/// Empty rally point section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RallyPoints {
    pub points: Vec<[f64; 3]>,
    pub version: u8,
}

impl Default for RallyPoints {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            version: RALLY_POINTS_VERSION,
        }
    }
}

/// Complete `.plan` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanFile {
    pub file_type: String,
    pub geo_fence: GeoFence,
    pub ground_station: String,
    pub mission: MissionPlan,
    pub rally_points: RallyPoints,
    pub version: u8,
}

impl PlanFile {
    pub fn new(mission: MissionPlan) -> Self {
        Self {
            file_type: PLAN_FILE_TYPE.to_string(),
            geo_fence: GeoFence::default(),
            ground_station: GROUND_STATION.to_string(),
            mission,
            rally_points: RallyPoints::default(),
            version: PLAN_FILE_VERSION,
        }
    }

    pub fn from_legs(legs: &[Leg], options: &MissionOptions) -> Self {
        Self::new(MissionPlan::from_legs(legs, options))
    }

    /// Render as pretty-printed JSON
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// TESTS
// ============================================================================
