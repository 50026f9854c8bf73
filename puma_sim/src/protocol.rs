// Line-delimited JSON protocol of the arm simulator.
//
// One request object per line, tagged by "Command". Every request gets one
// response tagged with the same command. ErrorID is 0 on success and 1 when
// the arm rejected the request and kept its previous state.

use nalgebra::Vector3;
use puma_kinematics::{ArmController, JointConfiguration};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const ERROR_NONE: u32 = 0;
pub const ERROR_REJECTED: u32 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Point {
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "Z")]
    pub z: f64,
}

impl From<Point> for Vector3<f64> {
    fn from(point: Point) -> Self {
        Vector3::new(point.x, point.y, point.z)
    }
}

impl From<Vector3<f64>> for Point {
    fn from(v: Vector3<f64>) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

/// Euler angles in degrees about x (W), y (P) and z (R).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    #[serde(rename = "W")]
    pub w: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "R")]
    pub r: f64,
}

impl From<Orientation> for Vector3<f64> {
    fn from(orientation: Orientation) -> Self {
        Vector3::new(orientation.w, orientation.p, orientation.r)
    }
}

/// Joint angles in degrees plus the extension.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct JointAngles {
    #[serde(rename = "J1")]
    pub j1: f64,
    #[serde(rename = "Q2")]
    pub q2: f64,
    #[serde(rename = "J2")]
    pub j2: f64,
    #[serde(rename = "J3")]
    pub j3: f64,
    #[serde(rename = "J4")]
    pub j4: f64,
    #[serde(rename = "J5")]
    pub j5: f64,
}

impl From<&JointConfiguration<f64>> for JointAngles {
    fn from(configuration: &JointConfiguration<f64>) -> Self {
        let degrees = configuration.in_degrees();
        Self {
            j1: degrees.theta1,
            q2: degrees.q2,
            j2: degrees.theta2,
            j3: degrees.theta3,
            j4: degrees.theta4,
            j5: degrees.theta5,
        }
    }
}

impl From<JointAngles> for JointConfiguration<f64> {
    fn from(angles: JointAngles) -> Self {
        JointConfiguration::from_degrees(angles.j1, angles.q2, angles.j2, angles.j3, angles.j4, angles.j5)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Target {
    #[serde(rename = "Position")]
    pub position: Point,
    #[serde(rename = "Orientation", default)]
    pub orientation: Orientation,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Advance {
    #[serde(rename = "T")]
    pub t: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SetJointAngles {
    #[serde(rename = "Angles")]
    pub angles: JointAngles,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SetLinkLengths {
    #[serde(rename = "BaseHeight")]
    pub base_height: f64,
    #[serde(rename = "Link3Length")]
    pub link3_length: f64,
    #[serde(rename = "Link4Length")]
    pub link4_length: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "Command")]
pub enum Request {
    #[serde(rename = "MoveToPoint")]
    MoveToPoint(Target),

    #[serde(rename = "SetStartPoint")]
    SetStartPoint(Target),

    #[serde(rename = "SetEndPoint")]
    SetEndPoint(Target),

    #[serde(rename = "Advance")]
    Advance(Advance),

    #[serde(rename = "SetJointAngles")]
    SetJointAngles(SetJointAngles),

    #[serde(rename = "SetLinkLengths")]
    SetLinkLengths(SetLinkLengths),

    #[serde(rename = "ReadState")]
    ReadState,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Ack {
    #[serde(rename = "ErrorID")]
    pub error_id: u32,
}

impl Ack {
    fn from_outcome(accepted: bool) -> Self {
        Self {
            error_id: if accepted { ERROR_NONE } else { ERROR_REJECTED },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ArmState {
    #[serde(rename = "ErrorID")]
    pub error_id: u32,
    #[serde(rename = "JointAngles")]
    pub joint_angles: JointAngles,
    #[serde(rename = "Position")]
    pub position: Point,
    #[serde(rename = "BaseHeight")]
    pub base_height: f64,
    #[serde(rename = "Link3Length")]
    pub link3_length: f64,
    #[serde(rename = "Link4Length")]
    pub link4_length: f64,
}

impl From<&ArmController<f64>> for ArmState {
    fn from(arm: &ArmController<f64>) -> Self {
        Self {
            error_id: ERROR_NONE,
            joint_angles: JointAngles::from(arm.configuration()),
            position: Point::from(arm.end_effector()),
            base_height: arm.base_height(),
            link3_length: arm.link3_length(),
            link4_length: arm.link4_length(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "Command")]
pub enum Response {
    #[serde(rename = "MoveToPoint")]
    MoveToPoint(Ack),

    #[serde(rename = "SetStartPoint")]
    SetStartPoint(Ack),

    #[serde(rename = "SetEndPoint")]
    SetEndPoint(Ack),

    #[serde(rename = "Advance")]
    Advance(Ack),

    #[serde(rename = "SetJointAngles")]
    SetJointAngles(Ack),

    #[serde(rename = "SetLinkLengths")]
    SetLinkLengths(Ack),

    #[serde(rename = "ReadState")]
    ReadState(ArmState),
}

impl Response {
    pub fn error_id(&self) -> u32 {
        match self {
            Response::MoveToPoint(ack)
            | Response::SetStartPoint(ack)
            | Response::SetEndPoint(ack)
            | Response::Advance(ack)
            | Response::SetJointAngles(ack)
            | Response::SetLinkLengths(ack) => ack.error_id,
            Response::ReadState(state) => state.error_id,
        }
    }
}

/// Sent instead of a [`Response`] when a line is not a valid request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProtocolError {
    #[serde(rename = "Error")]
    pub error: String,
}

/// Apply one request to the arm.
pub fn handle_request(arm: &mut ArmController<f64>, request: Request) -> Response {
    match request {
        Request::MoveToPoint(target) => Response::MoveToPoint(Ack::from_outcome(
            arm.move_to_point(target.position.into(), target.orientation.into()),
        )),
        Request::SetStartPoint(target) => Response::SetStartPoint(Ack::from_outcome(
            arm.set_start_point(target.position.into(), target.orientation.into()),
        )),
        Request::SetEndPoint(target) => Response::SetEndPoint(Ack::from_outcome(
            arm.set_end_point(target.position.into(), target.orientation.into()),
        )),
        Request::Advance(advance) => {
            Response::Advance(Ack::from_outcome(arm.advance_animation(advance.t)))
        }
        Request::SetJointAngles(set) => Response::SetJointAngles(Ack::from_outcome(
            arm.set_configuration(set.angles.into()),
        )),
        Request::SetLinkLengths(set) => {
            let result = arm.set_link_lengths(set.base_height, set.link3_length, set.link4_length);
            if let Err(e) = &result {
                warn!("rejecting link lengths: {}", e);
            }
            Response::SetLinkLengths(Ack::from_outcome(result.is_ok()))
        }
        Request::ReadState => Response::ReadState(ArmState::from(&*arm)),
    }
}

/// Handle one request line and produce the response line, `\r\n` included.
pub fn respond_to_line(arm: &mut ArmController<f64>, line: &str) -> Result<String, serde_json::Error> {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => Ok(serde_json::to_string(&handle_request(arm, request))? + "\r\n"),
        Err(e) => {
            warn!("Failed to parse request: {}", e);
            error_line(e.to_string())
        }
    }
}

/// A [`ProtocolError`] line, `\r\n` included.
pub fn error_line(message: impl Into<String>) -> Result<String, serde_json::Error> {
    let body = serde_json::to_string(&ProtocolError {
        error: message.into(),
    })?;
    Ok(body + "\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let request: Request = serde_json::from_value(json!({
            "Command": "MoveToPoint",
            "Position": {"X": 2.0, "Y": 0.0, "Z": 0.0},
            "Orientation": {"W": 0.0, "P": 0.0, "R": 90.0}
        }))
        .unwrap();
        assert_eq!(
            request,
            Request::MoveToPoint(Target {
                position: Point { x: 2.0, y: 0.0, z: 0.0 },
                orientation: Orientation { w: 0.0, p: 0.0, r: 90.0 },
            })
        );

        let request: Request = serde_json::from_str(r#"{"Command":"ReadState"}"#).unwrap();
        assert_eq!(request, Request::ReadState);

        let request: Request = serde_json::from_str(r#"{"Command":"Advance","T":0.25}"#).unwrap();
        assert_eq!(request, Request::Advance(Advance { t: 0.25 }));
    }

    #[test]
    fn test_orientation_defaults_to_zero() {
        let request: Request = serde_json::from_str(
            r#"{"Command":"SetEndPoint","Position":{"X":1.0,"Y":2.0,"Z":3.0}}"#,
        )
        .unwrap();
        let Request::SetEndPoint(target) = request else {
            panic!("wrong variant: {:?}", request);
        };
        assert_eq!(target.orientation, Orientation::default());
    }

    #[test]
    fn test_response_wire_format() {
        let value = serde_json::to_value(Response::Advance(Ack { error_id: 1 })).unwrap();
        assert_eq!(value, json!({"Command": "Advance", "ErrorID": 1}));
    }

    #[test]
    fn test_joint_angles_convert_through_degrees() {
        let angles = JointAngles { j1: 90.0, q2: 1.5, j2: -45.0, j3: 0.0, j4: 30.0, j5: 180.0 };
        let configuration = JointConfiguration::from(angles);
        assert!((configuration.theta1 - std::f64::consts::FRAC_PI_2).abs() < 1e-12);

        let back = JointAngles::from(&configuration);
        assert!((back.j4 - 30.0).abs() < 1e-9);
        assert_eq!(back.q2, 1.5);
    }

    #[test]
    fn test_bad_line_gets_error_object() {
        let mut arm = ArmController::default();
        let line = respond_to_line(&mut arm, r#"{"Command":"Fly"}"#).unwrap();
        assert!(line.ends_with("\r\n"));
        let error: ProtocolError = serde_json::from_str(line.trim_end()).unwrap();
        assert!(!error.error.is_empty());
    }
}
