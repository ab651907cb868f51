//! In-process stand-in for the XFLR5-RPC server.
//!
//! Implements the procedures the client uses over plain in-memory state and
//! records every call, so tests can assert both on results and on the exact
//! traffic the client generated.

#![allow(dead_code)]

use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use xflr_core::{Result, RpcTransport, XflrClient, XflrError};

#[derive(Debug, Clone)]
pub struct FakeFoil {
    pub name: String,
    pub camber: f64,
    pub camber_x: f64,
    pub thickness: f64,
    pub thickness_x: f64,
    pub coords: Vec<[f64; 2]>,
    pub style: Value,
}

impl FakeFoil {
    fn generated(name: &str, camber: f64, camber_x: f64, thickness: f64, thickness_x: f64) -> Self {
        Self {
            name: name.to_string(),
            camber,
            camber_x,
            thickness,
            thickness_x,
            coords: outline(camber, camber_x, thickness),
            style: default_style(),
        }
    }

    fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "camber": self.camber,
            "camber_x": self.camber_x,
            "thickness": self.thickness,
            "thickness_x": self.thickness_x,
            "n": self.coords.len(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct FakePolar {
    pub foil: String,
    pub name: String,
    pub spec: Value,
    pub alpha: Vec<f64>,
    pub reynolds: f64,
}

impl FakePolar {
    fn to_value(&self) -> Value {
        json!({"name": self.name, "foil_name": self.foil, "spec": self.spec})
    }
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub foils: Vec<FakeFoil>,
    pub polars: Vec<FakePolar>,
    pub planes: Vec<Value>,
    pub wpolars: Vec<Value>,
    pub app: i64,
    pub project_name: String,
    pub project_path: String,
    pub saved: bool,
    pub loaded: Vec<String>,
    pub calls: Vec<(String, Vec<Value>)>,
    pub failing: HashSet<String>,
    pub alive: bool,
    pub closed: bool,
}

pub struct FakeXflrServer {
    state: Mutex<FakeState>,
}

impl FakeXflrServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                alive: true,
                saved: true,
                ..Default::default()
            }),
        })
    }

    /// A connected client over a fresh fake server.
    pub async fn connected() -> (Arc<Self>, XflrClient) {
        let server = Self::new();
        let client = XflrClient::with_transport(server.clone())
            .await
            .expect("fake server accepts the connection");
        (server, client)
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn add_naca(&self, digits: i64, name: &str) {
        self.with_state(|s| upsert_foil(s, naca(digits, name)));
    }

    pub fn add_plane(&self, plane: Value) {
        self.with_state(|s| s.planes.push(plane));
    }

    /// Make every later call to `method` fail with a remote error.
    pub fn fail_on(&self, method: &str) {
        self.with_state(|s| s.failing.insert(method.to_string()));
    }

    pub fn set_alive(&self, alive: bool) {
        self.with_state(|s| s.alive = alive);
    }

    pub fn call_names(&self) -> Vec<String> {
        self.with_state(|s| s.calls.iter().map(|(m, _)| m.clone()).collect())
    }

    pub fn calls_to(&self, method: &str) -> Vec<Vec<Value>> {
        self.with_state(|s| {
            s.calls
                .iter()
                .filter(|(m, _)| m == method)
                .map(|(_, a)| a.clone())
                .collect()
        })
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls_to(method).len()
    }

    pub fn clear_calls(&self) {
        self.with_state(|s| s.calls.clear());
    }

    pub fn foil_names(&self) -> Vec<String> {
        self.with_state(|s| s.foils.iter().map(|f| f.name.clone()).collect())
    }

    pub fn app(&self) -> i64 {
        self.with_state(|s| s.app)
    }

    fn dispatch(&self, method: &str, args: &[Value]) -> std::result::Result<Value, String> {
        let mut s = self.state.lock().unwrap();
        s.calls.push((method.to_string(), args.to_vec()));
        if !s.alive {
            return Err("__transport__".to_string());
        }
        if s.failing.contains(method) {
            return Err(format!("{} failed", method));
        }

        match method {
            "ping" => Ok(json!(true)),
            "getState" => Ok(json!({
                "projectPath": s.project_path,
                "projectName": s.project_name,
                "app": s.app,
                "saved": s.saved,
                "display": {"foil_count": s.foils.len()},
            })),
            "setApp" => {
                let code = int(args, 0)?;
                if !(0..=4).contains(&code) {
                    return Err(format!("unknown application {}", code));
                }
                s.app = code;
                Ok(Value::Null)
            }
            "foilList" => Ok(Value::Array(s.foils.iter().map(FakeFoil::to_value).collect())),
            "getFoil" => Ok(foil(&s, &string(args, 0)?)?.to_value()),
            "renameFoil" => {
                let (old, new) = (string(args, 0)?, string(args, 1)?);
                foil_mut(&mut s, &old)?.name = new.clone();
                for polar in s.polars.iter_mut().filter(|p| p.foil == old) {
                    polar.foil = new.clone();
                }
                Ok(Value::Null)
            }
            "duplicateFoil" => {
                let mut copy = foil(&s, &string(args, 0)?)?.clone();
                copy.name = string(args, 1)?;
                let value = copy.to_value();
                upsert_foil(&mut s, copy);
                Ok(value)
            }
            "deleteFoil" => {
                let name = string(args, 0)?;
                foil(&s, &name)?;
                s.foils.retain(|f| f.name != name);
                s.polars.retain(|p| p.foil != name);
                Ok(Value::Null)
            }
            "setFoilCoords" => {
                let coords: Vec<[f64; 2]> = serde_json::from_value(arg(args, 1)?.clone())
                    .map_err(|e| e.to_string())?;
                foil_mut(&mut s, &string(args, 0)?)?.coords = coords;
                Ok(Value::Null)
            }
            "getFoilCoords" => Ok(json!(foil(&s, &string(args, 0)?)?.coords)),
            "setGeom" => {
                let name = string(args, 0)?;
                let (c, cx, t, tx) = (
                    float(args, 1)?,
                    float(args, 2)?,
                    float(args, 3)?,
                    float(args, 4)?,
                );
                let f = foil_mut(&mut s, &name)?;
                *f = FakeFoil {
                    style: f.style.clone(),
                    ..FakeFoil::generated(&name, c, cx, t, tx)
                };
                Ok(Value::Null)
            }
            "normalizeFoil" | "derotateFoil" | "setCurFoil" => {
                foil(&s, &string(args, 0)?)?;
                Ok(Value::Null)
            }
            "exportFoil" => {
                let f = foil(&s, &string(args, 0)?)?.clone();
                let mut text = format!("{}\n", f.name);
                for [x, y] in &f.coords {
                    text.push_str(&format!("  {:.6}  {:.6}\n", x, y));
                }
                std::fs::write(string(args, 1)?, text).map_err(|e| e.to_string())?;
                Ok(Value::Null)
            }
            "showFoil" => {
                let visible = arg(args, 1)?.as_bool().ok_or("visible must be a bool")?;
                foil_mut(&mut s, &string(args, 0)?)?.style["visible"] = json!(visible);
                Ok(Value::Null)
            }
            "getLineStyle" => Ok(foil(&s, &string(args, 0)?)?.style.clone()),
            "setLineStyle" => {
                let style = arg(args, 1)?.clone();
                foil_mut(&mut s, &string(args, 0)?)?.style = style;
                Ok(Value::Null)
            }
            "validateFilePaths" => {
                let paths = arg(args, 0)?.as_array().ok_or("paths must be a list")?;
                Ok(Value::Array(
                    paths
                        .iter()
                        .map(|p| json!([p.as_str().map(|p| Path::new(p).exists()).unwrap_or(false)]))
                        .collect(),
                ))
            }
            "loadProject" => {
                let files = arg(args, 0)?.as_array().ok_or("files must be a list")?.clone();
                for file in files {
                    let path = file.as_str().ok_or("file must be a string")?.to_string();
                    if path.to_lowercase().ends_with(".dat") {
                        let loaded = read_dat(&path)?;
                        upsert_foil(&mut s, loaded);
                    } else {
                        s.project_path = path.clone();
                        s.project_name = stem(&path);
                    }
                    s.loaded.push(path);
                }
                Ok(Value::Null)
            }
            "createNACAFoil" => {
                let digits = int(args, 0)?;
                let name = string(args, 1)?;
                upsert_foil(&mut s, naca(digits, &name));
                Ok(Value::Null)
            }
            "polarList" => {
                let name = string(args, 0)?;
                Ok(Value::Array(
                    s.polars
                        .iter()
                        .filter(|p| p.foil == name)
                        .map(FakePolar::to_value)
                        .collect(),
                ))
            }
            "defineAnalysis2D" => {
                let request = arg(args, 0)?;
                let foil_name = request["foil_name"].as_str().unwrap_or_default().to_string();
                foil(&s, &foil_name)?;
                let spec = request["spec"].clone();
                let reynolds = spec["reynolds"].as_f64().unwrap_or(100_000.0);
                let mut name = request["name"].as_str().unwrap_or_default().to_string();
                if name.is_empty() {
                    name = format!(
                        "T{}_Re{:.3}_M0.00_N9.0",
                        spec["polar_type"].as_i64().unwrap_or(0) + 1,
                        reynolds / 1e6
                    );
                }
                let polar = FakePolar {
                    foil: foil_name,
                    name,
                    spec,
                    alpha: Vec::new(),
                    reynolds,
                };
                let value = polar.to_value();
                s.polars.retain(|p| !(p.foil == polar.foil && p.name == polar.name));
                s.polars.push(polar);
                Ok(value)
            }
            "getPolar" => Ok(polar(&s, &string(args, 0)?, &string(args, 1)?)?.to_value()),
            "analyzePolar" => {
                if s.app != 1 {
                    return Err("direct analysis is not active".to_string());
                }
                let request = arg(args, 0)?;
                let foil_name = request["foil_name"].as_str().unwrap_or_default().to_string();
                let name = request["name"].as_str().unwrap_or_default().to_string();
                let sweep = &arg(args, 1)?["sequence"];
                let alpha = sweep_points(sweep)?;
                let fields = codes(arg(args, 2)?)?;
                let p = polar_mut(&mut s, &foil_name, &name)?;
                p.alpha = alpha;
                Ok(result_columns(p, &fields))
            }
            "getPolarResult" => {
                let p = polar(&s, &string(args, 0)?, &string(args, 1)?)?;
                let fields = codes(arg(args, 2)?)?;
                Ok(result_columns(p, &fields))
            }
            "getOpPoints" => {
                let p = polar(&s, &string(args, 0)?, &string(args, 1)?)?;
                Ok(Value::Array(
                    p.alpha
                        .iter()
                        .map(|a| {
                            json!({
                                "alpha": a,
                                "polar_name": p.name,
                                "foil_name": p.foil,
                                "Cl": lift(*a),
                                "Cd": drag(*a),
                                "Re": p.reynolds,
                                "mach": 0.0,
                            })
                        })
                        .collect(),
                ))
            }
            "deletePolar" => {
                let (foil_name, name) = (string(args, 0)?, string(args, 1)?);
                polar(&s, &foil_name, &name)?;
                s.polars.retain(|p| !(p.foil == foil_name && p.name == name));
                Ok(Value::Null)
            }
            "batchAnalyze" => {
                let settings = arg(args, 0)?.clone();
                let names: Vec<String> =
                    serde_json::from_value(settings["foil_names"].clone()).map_err(|e| e.to_string())?;
                let re_list: Vec<f64> =
                    serde_json::from_value(settings["re_list"].clone()).map_err(|e| e.to_string())?;
                let alpha = sweep_points(&json!([
                    settings["min"],
                    settings["max"],
                    settings["increment"]
                ]))?;
                for foil_name in names {
                    foil(&s, &foil_name)?;
                    for re in &re_list {
                        let name = format!("T1_Re{:.3}_M0.00_N9.0", re / 1e6);
                        s.polars.retain(|p| !(p.foil == foil_name && p.name == name));
                        s.polars.push(FakePolar {
                            foil: foil_name.clone(),
                            name,
                            spec: json!({"polar_type": settings["polar_type"], "reynolds": re}),
                            alpha: alpha.clone(),
                            reynolds: *re,
                        });
                    }
                }
                Ok(Value::Null)
            }
            "getPlanes" => Ok(Value::Array(s.planes.clone())),
            "getPlaneData" => {
                let name = string(args, 0)?;
                if !s.planes.iter().any(|p| p["name"] == json!(name)) {
                    return Err(format!("no plane named {}", name));
                }
                Ok(json!(
                    "Wing Span = 2.000 m\nWing Area = 0.350 m2\nMass = 1.200 kg\nAspect ratio = 11.43"
                ))
            }
            "defineAnalysis3D" => {
                let wpolar = arg(args, 0)?.clone();
                let plane_name = wpolar["plane_name"].as_str().unwrap_or_default().to_string();
                if !s.planes.iter().any(|p| p["name"] == json!(plane_name)) {
                    return Err(format!("no plane named {}", plane_name));
                }
                s.wpolars.push(wpolar);
                Ok(Value::Null)
            }
            "analyzeWPolar" => {
                if s.app != 4 {
                    return Err("plane design is not active".to_string());
                }
                let (name, plane_name) = (string(args, 0)?, string(args, 1)?);
                if !s
                    .wpolars
                    .iter()
                    .any(|w| w["name"] == json!(name) && w["plane_name"] == json!(plane_name))
                {
                    return Err(format!("no 3D polar {} on {}", name, plane_name));
                }
                let alpha = sweep_points(&arg(args, 2)?["sequence"])?;
                let cl: Vec<f64> = alpha.iter().map(|a| lift(*a) * 0.8).collect();
                Ok(json!({"alpha": alpha, "Cl": cl}))
            }
            "newProject" => {
                s.foils.clear();
                s.polars.clear();
                s.project_name.clear();
                s.project_path.clear();
                s.saved = false;
                Ok(Value::Null)
            }
            "setProjectPath" => {
                let path = string(args, 0)?;
                s.project_name = stem(&path);
                s.project_path = path;
                Ok(Value::Null)
            }
            "saveProject" => {
                if s.project_path.is_empty() {
                    return Err("project has no path".to_string());
                }
                s.saved = true;
                Ok(Value::Null)
            }
            "exit" => Ok(Value::Null),
            other => Err(format!("unknown method {}", other)),
        }
    }
}

#[async_trait::async_trait]
impl RpcTransport for FakeXflrServer {
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        self.dispatch(method, &args).map_err(|message| {
            if message == "__transport__" {
                XflrError::Transport {
                    message: "connection reset".to_string(),
                    source: None,
                }
            } else {
                XflrError::Remote {
                    method: method.to_string(),
                    message,
                }
            }
        })
    }

    async fn close(&self) -> Result<()> {
        self.with_state(|s| s.closed = true);
        Ok(())
    }

    fn peer(&self) -> String {
        "fake-xflr5".to_string()
    }
}

/// NACA 4-digit parameters: first digit camber (%), second its position
/// (tenths), last two thickness (%).
pub fn naca(digits: i64, name: &str) -> FakeFoil {
    let camber = (digits / 1000) as f64 / 100.0;
    let camber_x = ((digits / 100) % 10) as f64 / 10.0;
    let thickness = (digits % 100) as f64 / 100.0;
    FakeFoil::generated(name, camber, camber_x, thickness, 0.3)
}

/// Write a small Selig `.dat` file and return its path.
pub fn write_dat(dir: &Path, file_name: &str, foil_name: &str) -> String {
    let foil = naca(2412, foil_name);
    let mut text = format!("{}\n", foil_name);
    for [x, y] in &foil.coords {
        text.push_str(&format!("  {:.6}  {:.6}\n", x, y));
    }
    let path = dir.join(file_name);
    std::fs::write(&path, text).unwrap();
    path.to_string_lossy().into_owned()
}

fn default_style() -> Value {
    json!({
        "visible": true,
        "stipple": 0,
        "point_style": 0,
        "width": 1,
        "color": [0, 0, 255, 255],
        "tag": ""
    })
}

fn outline(camber: f64, camber_x: f64, thickness: f64) -> Vec<[f64; 2]> {
    const HALF: usize = 20;
    let xs: Vec<f64> = (0..=HALF)
        .map(|i| 0.5 * (1.0 + (std::f64::consts::PI * i as f64 / HALF as f64).cos()))
        .collect();
    let half_thickness = |x: f64| {
        5.0 * thickness
            * (0.2969 * x.sqrt() - 0.1260 * x - 0.3516 * x * x + 0.2843 * x.powi(3)
                - 0.1015 * x.powi(4))
    };
    let camber_line = |x: f64| {
        if camber == 0.0 || camber_x == 0.0 {
            0.0
        } else if x < camber_x {
            camber / (camber_x * camber_x) * (2.0 * camber_x * x - x * x)
        } else {
            camber / ((1.0 - camber_x) * (1.0 - camber_x))
                * ((1.0 - 2.0 * camber_x) + 2.0 * camber_x * x - x * x)
        }
    };
    let upper = xs.iter().map(|&x| [x, camber_line(x) + half_thickness(x)]);
    let lower = xs
        .iter()
        .rev()
        .skip(1)
        .map(|&x| [x, camber_line(x) - half_thickness(x)]);
    upper.chain(lower).collect()
}

fn read_dat(path: &str) -> std::result::Result<FakeFoil, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let mut lines = text.lines();
    let name = lines.next().unwrap_or_default().trim().to_string();
    let coords = lines
        .filter_map(|line| {
            let mut parts = line.split_whitespace().map(|v| v.parse::<f64>());
            match (parts.next(), parts.next()) {
                (Some(Ok(x)), Some(Ok(y))) => Some([x, y]),
                _ => None,
            }
        })
        .collect();
    Ok(FakeFoil {
        name,
        camber: 0.0,
        camber_x: 0.0,
        thickness: 0.0,
        thickness_x: 0.0,
        coords,
        style: default_style(),
    })
}

fn upsert_foil(s: &mut FakeState, foil: FakeFoil) {
    match s.foils.iter_mut().find(|f| f.name == foil.name) {
        Some(existing) => *existing = foil,
        None => s.foils.push(foil),
    }
}

fn foil<'a>(s: &'a FakeState, name: &str) -> std::result::Result<&'a FakeFoil, String> {
    s.foils
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| format!("no foil named {}", name))
}

fn foil_mut<'a>(s: &'a mut FakeState, name: &str) -> std::result::Result<&'a mut FakeFoil, String> {
    s.foils
        .iter_mut()
        .find(|f| f.name == name)
        .ok_or_else(|| format!("no foil named {}", name))
}

fn polar<'a>(s: &'a FakeState, foil: &str, name: &str) -> std::result::Result<&'a FakePolar, String> {
    s.polars
        .iter()
        .find(|p| p.foil == foil && p.name == name)
        .ok_or_else(|| format!("no polar {} on {}", name, foil))
}

fn polar_mut<'a>(
    s: &'a mut FakeState,
    foil: &str,
    name: &str,
) -> std::result::Result<&'a mut FakePolar, String> {
    s.polars
        .iter_mut()
        .find(|p| p.foil == foil && p.name == name)
        .ok_or_else(|| format!("no polar {} on {}", name, foil))
}

fn arg(args: &[Value], i: usize) -> std::result::Result<&Value, String> {
    args.get(i).ok_or_else(|| format!("missing argument {}", i))
}

fn string(args: &[Value], i: usize) -> std::result::Result<String, String> {
    arg(args, i)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("argument {} must be a string", i))
}

fn int(args: &[Value], i: usize) -> std::result::Result<i64, String> {
    arg(args, i)?
        .as_i64()
        .ok_or_else(|| format!("argument {} must be an integer", i))
}

fn float(args: &[Value], i: usize) -> std::result::Result<f64, String> {
    arg(args, i)?
        .as_f64()
        .ok_or_else(|| format!("argument {} must be a number", i))
}

fn codes(value: &Value) -> std::result::Result<Vec<i64>, String> {
    value
        .as_array()
        .ok_or("fields must be a list")?
        .iter()
        .map(|c| match c.as_i64() {
            Some(code) if (0..=13).contains(&code) => Ok(code),
            _ => Err(format!("bad field {}", c)),
        })
        .collect()
}

/// Nominal points of a `[start, end, increment]` sweep.
fn sweep_points(sweep: &Value) -> std::result::Result<Vec<f64>, String> {
    let parts: Vec<f64> = serde_json::from_value(sweep.clone()).map_err(|e| e.to_string())?;
    let (start, end, inc) = match parts.as_slice() {
        [s, e, i] => (*s, *e, *i),
        _ => return Err("sweep must have three values".to_string()),
    };
    let span = end - start;
    if span == 0.0 || inc == 0.0 {
        return Ok(vec![start]);
    }
    let count = (span.abs() / inc.abs() + 1e-9).floor() as usize + 1;
    let step = inc.abs() * span.signum();
    Ok((0..count).map(|i| start + step * i as f64).collect())
}

fn lift(alpha: f64) -> f64 {
    2.0 * std::f64::consts::PI * alpha.to_radians()
}

fn drag(alpha: f64) -> f64 {
    0.006 + 0.0001 * alpha * alpha
}

fn result_columns(p: &FakePolar, fields: &[i64]) -> Value {
    let mut out = Map::new();
    for code in fields {
        let (key, column): (&str, Vec<f64>) = match code {
            0 => ("alpha", p.alpha.clone()),
            1 => ("Cl", p.alpha.iter().map(|a| lift(*a)).collect()),
            3 => ("Cd", p.alpha.iter().map(|a| drag(*a)).collect()),
            10 => ("ClCd", p.alpha.iter().map(|a| lift(*a) / drag(*a)).collect()),
            13 => ("Re", vec![p.reynolds; p.alpha.len()]),
            _ => continue,
        };
        out.insert(key.to_string(), json!(column));
    }
    Value::Object(out)
}

fn stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
