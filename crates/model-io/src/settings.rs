use transport_types::{
    AngularDistribution, EnergyDistribution, Settings, Source, SpatialDistribution,
};

use crate::xml::{join_numbers, XmlElement};

/// Build the `<settings>` element.
pub fn settings_xml(settings: &Settings) -> XmlElement {
    XmlElement::new("settings")
        .child(XmlElement::new("run_mode").text(settings.run_mode.as_str()))
        .child(XmlElement::new("particles").text(settings.particles))
        .child(XmlElement::new("batches").text(settings.batches))
        .child(XmlElement::new("inactive").text(settings.inactive))
        .child(source_xml(&settings.source))
}

fn source_xml(source: &Source) -> XmlElement {
    let space = match &source.space {
        SpatialDistribution::Point(xyz) => XmlElement::new("space")
            .attr("type", "point")
            .child(XmlElement::new("parameters").text(join_numbers(xyz))),
    };
    let angle = match source.angle {
        AngularDistribution::Isotropic => XmlElement::new("angle").attr("type", "isotropic"),
    };
    let energy = match &source.energy {
        EnergyDistribution::Discrete {
            energies,
            probabilities,
        } => {
            let mut params = energies.clone();
            params.extend_from_slice(probabilities);
            XmlElement::new("energy")
                .attr("type", "discrete")
                .child(XmlElement::new("parameters").text(join_numbers(&params)))
        }
    };

    XmlElement::new("source")
        .attr("particle", source.particle.as_str())
        .attr("strength", source.strength)
        .attr("type", "independent")
        .child(space)
        .child(angle)
        .child(energy)
}
